// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider interface and the Firebase Authentication REST client.
//!
//! The REST API reports failures as upper-case codes (`EMAIL_NOT_FOUND`).
//! These are normalised to the `auth/...` codes the client SDKs use, so
//! error text looks the same whichever provider produced it.

use crate::models::SessionUser;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::RwLock;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity provider error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Provider refused the request; carries an `auth/...` code.
    #[error("Firebase: Error ({0}).")]
    Rejected(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Identity provider error: {0}")]
    Unknown(String),
}

impl IdentityError {
    /// The `auth/...` code, when the provider rejected the request.
    pub fn code(&self) -> Option<&str> {
        match self {
            IdentityError::Rejected(code) => Some(code),
            _ => None,
        }
    }
}

/// Email/password identity provider with a process-wide session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn create_account(&self, email: &str, password: &str)
        -> Result<SessionUser, IdentityError>;

    /// Set the display name of a freshly created or signed-in user.
    async fn update_display_name(
        &self,
        user: &SessionUser,
        display_name: &str,
    ) -> Result<SessionUser, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Ask the provider to email a password-reset link.
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// User of the current session, if any.
    fn current_user(&self) -> Option<SessionUser>;
}

/// Map an Identity Toolkit error message onto an SDK-style code.
///
/// Messages look like `WEAK_PASSWORD : Password should be at least 6
/// characters`; only the part before ` : ` is the code.
pub fn sdk_error_code(message: &str) -> String {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    let mapped = match code {
        "EMAIL_NOT_FOUND" => "auth/user-not-found",
        "INVALID_EMAIL" => "auth/invalid-email",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
        "USER_DISABLED" => "auth/user-disabled",
        "WEAK_PASSWORD" => "auth/weak-password",
        "MISSING_PASSWORD" => "auth/missing-password",
        "OPERATION_NOT_ALLOWED" => "auth/operation-not-allowed",
        "INVALID_ID_TOKEN" => "auth/invalid-user-token",
        other => return format!("auth/{}", other.to_lowercase().replace('_', "-")),
    };
    mapped.to_string()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Account payload returned by signUp, signInWithPassword and update.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

/// Firebase Authentication (Identity Toolkit v1) client.
pub struct FirebaseIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<SessionUser>>,
}

impl FirebaseIdentity {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL)
    }

    /// Client against a non-default endpoint (emulator or test server).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session: RwLock::new(None),
        }
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, IdentityError> {
        let url = format!("{}/accounts:{}?key={}", self.base_url, method, self.api_key);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| IdentityError::Unknown(format!("JSON parse error: {}", e)));
        }

        if status.as_u16() == 429 || status.is_server_error() {
            return Err(IdentityError::Unavailable(format!("HTTP {}", status)));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(IdentityError::Rejected(sdk_error_code(
                &envelope.error.message,
            ))),
            Err(_) => Err(IdentityError::Unknown(format!("HTTP {}: {}", status, body))),
        }
    }

    fn set_session(&self, user: Option<SessionUser>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = user;
        }
    }

    fn to_session_user(account: AccountResponse, fallback_email: &str) -> SessionUser {
        SessionUser {
            uid: account.local_id,
            email: account.email.unwrap_or_else(|| fallback_email.to_string()),
            display_name: account.display_name.filter(|n| !n.is_empty()),
            id_token: account.id_token,
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, IdentityError> {
        let account: AccountResponse = self
            .call(
                "signUp",
                json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;

        let user = Self::to_session_user(account, email);
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn update_display_name(
        &self,
        user: &SessionUser,
        display_name: &str,
    ) -> Result<SessionUser, IdentityError> {
        let id_token = user
            .id_token
            .as_deref()
            .ok_or_else(|| IdentityError::Rejected("auth/invalid-user-token".to_string()))?;

        let account: AccountResponse = self
            .call(
                "update",
                json!({
                    "idToken": id_token,
                    "displayName": display_name,
                    "returnSecureToken": true
                }),
            )
            .await?;

        let mut updated = Self::to_session_user(account, &user.email);
        updated.display_name = Some(display_name.to_string());
        if updated.id_token.is_none() {
            updated.id_token = user.id_token.clone();
        }
        self.set_session(Some(updated.clone()));
        Ok(updated)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        let account: AccountResponse = self
            .call(
                "signInWithPassword",
                json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;

        let user = Self::to_session_user(account, email);
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        // ID tokens are stateless; dropping the local session is all there is.
        self.set_session(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                json!({"requestType": "PASSWORD_RESET", "email": email}),
            )
            .await?;
        Ok(())
    }

    fn current_user(&self) -> Option<SessionUser> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }
}
