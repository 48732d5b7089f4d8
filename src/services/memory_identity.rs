// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process identity provider for tests and offline mode.

use super::identity::{IdentityError, IdentityProvider};
use crate::models::SessionUser;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

#[derive(Clone)]
struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

/// Identity provider backed by an in-memory account table.
#[derive(Default)]
pub struct MemoryIdentity {
    /// Accounts keyed by lower-cased email
    accounts: DashMap<String, Account>,
    next_uid: AtomicU64,
    session: RwLock<Option<SessionUser>>,
    reset_requests: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails that were sent a password-reset link, in order.
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Make every call fail with `Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), IdentityError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable(
                "network-request-failed".to_string(),
            ));
        }
        Ok(())
    }

    fn set_session(&self, user: Option<SessionUser>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = user;
        }
    }

    fn session_user(email: &str, account: &Account) -> SessionUser {
        SessionUser {
            uid: account.uid.clone(),
            email: email.to_string(),
            display_name: account.display_name.clone(),
            id_token: Some(format!("memory-token-{}", account.uid)),
        }
    }
}

fn rejected(code: &str) -> IdentityError {
    IdentityError::Rejected(format!("auth/{}", code))
}

fn check_email(email: &str) -> Result<String, IdentityError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(rejected("invalid-email")),
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, IdentityError> {
        self.check_online()?;
        let email = check_email(email)?;
        if password.len() < 6 {
            return Err(rejected("weak-password"));
        }

        let uid = format!("uid{:06}", self.next_uid.fetch_add(1, Ordering::SeqCst) + 1);
        let account = Account {
            uid,
            password: password.to_string(),
            display_name: None,
        };

        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => return Err(rejected("email-already-in-use")),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
            }
        }

        let user = Self::session_user(&email, &account);
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn update_display_name(
        &self,
        user: &SessionUser,
        display_name: &str,
    ) -> Result<SessionUser, IdentityError> {
        self.check_online()?;
        let email = user.email.to_lowercase();
        let mut account = self
            .accounts
            .get_mut(&email)
            .ok_or_else(|| rejected("user-not-found"))?;
        account.display_name = Some(display_name.to_string());

        let updated = Self::session_user(&email, &account);
        drop(account);
        self.set_session(Some(updated.clone()));
        Ok(updated)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        self.check_online()?;
        let email = check_email(email)?;
        let account = self
            .accounts
            .get(&email)
            .map(|a| a.clone())
            .ok_or_else(|| rejected("user-not-found"))?;

        if account.password != password {
            return Err(rejected("wrong-password"));
        }

        let user = Self::session_user(&email, &account);
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.check_online()?;
        self.set_session(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        self.check_online()?;
        let email = check_email(email)?;
        if !self.accounts.contains_key(&email) {
            return Err(rejected("user-not-found"));
        }
        if let Ok(mut requests) = self.reset_requests.lock() {
            requests.push(email);
        }
        Ok(())
    }

    fn current_user(&self) -> Option<SessionUser> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }
}
