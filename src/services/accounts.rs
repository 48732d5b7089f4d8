// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account management: sign-up, sign-in, password reset and profiles.
//!
//! Thin layer over an [`IdentityProvider`] plus the `users/{uid}` records in
//! the realtime database. Each call is a single attempt; nothing is retried.

use super::identity::{IdentityError, IdentityProvider};
use crate::db::{paths, RealtimeDatabase, StoreError};
use crate::models::{SessionUser, UserProfile};
use crate::time_utils::now_millis;
use std::sync::Arc;

/// Account operation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The provider account exists but its profile record was not written.
    /// The account is left in place.
    #[error("Account {uid} was created but its profile could not be saved: {source}")]
    ProfileWrite {
        uid: String,
        #[source]
        source: StoreError,
    },

    /// Password reset failed; `message` is already user-facing.
    #[error("{message}")]
    PasswordReset {
        message: String,
        #[source]
        source: IdentityError,
    },
}

impl AccountError {
    /// Text to show inline in the calling form.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// The provider's `auth/...` code, if there is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            AccountError::Identity(e) | AccountError::PasswordReset { source: e, .. } => e.code(),
            AccountError::ProfileWrite { .. } => None,
        }
    }
}

/// Friendlier text for the password-reset failures users actually hit.
/// Anything else is passed through verbatim.
pub fn password_reset_message(error: &IdentityError) -> String {
    let raw = error.to_string();
    if raw.contains("user-not-found") {
        "No account found with this email address.".to_string()
    } else if raw.contains("invalid-email") {
        "Please enter a valid email address.".to_string()
    } else if raw.contains("too-many-requests") {
        "Too many requests. Please try again later.".to_string()
    } else {
        raw
    }
}

/// Account manager.
#[derive(Clone)]
pub struct AccountManager {
    identity: Arc<dyn IdentityProvider>,
    db: Arc<dyn RealtimeDatabase>,
}

impl AccountManager {
    pub fn new(identity: Arc<dyn IdentityProvider>, db: Arc<dyn RealtimeDatabase>) -> Self {
        Self { identity, db }
    }

    /// Create an account, set its display name and store its profile.
    ///
    /// The three steps are not atomic. A failed profile write is reported as
    /// [`AccountError::ProfileWrite`] and the provider account remains.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SessionUser, AccountError> {
        let created = self
            .identity
            .create_account(email, password)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Error creating account"))?;

        let user = self
            .identity
            .update_display_name(&created, display_name)
            .await
            .inspect_err(|e| {
                tracing::warn!(uid = %created.uid, error = %e, "Error setting display name")
            })?;

        let profile = UserProfile {
            uid: user.uid.clone(),
            email: if user.email.is_empty() {
                email.to_string()
            } else {
                user.email.clone()
            },
            display_name: display_name.to_string(),
            created_at: now_millis(),
        };

        if let Err(source) = self.write_profile(&profile).await {
            tracing::error!(
                uid = %user.uid,
                error = %source,
                "Account created but profile write failed; account not rolled back"
            );
            return Err(AccountError::ProfileWrite {
                uid: user.uid,
                source,
            });
        }

        tracing::info!(uid = %user.uid, "User account created");
        Ok(user)
    }

    async fn write_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let path = paths::user(&profile.uid)?;
        let value = serde_json::to_value(profile)?;
        self.db.write(&path, &value).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AccountError> {
        match self.identity.sign_in(email, password).await {
            Ok(user) => {
                tracing::info!(uid = %user.uid, "User signed in");
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error signing in");
                Err(e.into())
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AccountError> {
        self.identity
            .sign_out()
            .await
            .inspect(|_| tracing::info!("User signed out"))
            .inspect_err(|e| tracing::warn!(error = %e, "Error signing out"))?;
        Ok(())
    }

    /// Send a password-reset email.
    pub async fn reset_password(&self, email: &str) -> Result<(), AccountError> {
        match self.identity.send_password_reset(email).await {
            Ok(()) => {
                tracing::info!("Password reset email sent");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(error = %source, "Error sending password reset");
                Err(AccountError::PasswordReset {
                    message: password_reset_message(&source),
                    source,
                })
            }
        }
    }

    /// Fetch a stored profile. A missing record is `Ok(None)`.
    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        let path = paths::user(uid)?;
        let value = self
            .db
            .read(&path)
            .await
            .inspect_err(|e| tracing::error!(uid, error = %e, "Error getting user profile"))?;

        match value {
            Some(value) => Ok(Some(serde_json::from_value(value).inspect_err(|e| {
                tracing::error!(uid, error = %e, "Malformed user profile")
            })?)),
            None => Ok(None),
        }
    }

    /// User of the provider's current session.
    pub fn current_user(&self) -> Option<SessionUser> {
        self.identity.current_user()
    }
}
