// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Todoboard: personal todo list backend
//!
//! This crate provides account management and per-user todo tasks with
//! comment threads, stored in a hosted realtime database, plus the HTTP API
//! that serves them.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{FirebaseRtdb, MemoryDb, RealtimeDatabase};
use services::{
    AccountManager, FirebaseIdentity, IdentityProvider, MemoryIdentity, TaskStore,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub accounts: AccountManager,
    pub tasks: TaskStore,
}

impl AppState {
    /// Build services over explicitly supplied backends.
    pub fn new(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        db: Arc<dyn RealtimeDatabase>,
    ) -> Self {
        Self {
            config,
            accounts: AccountManager::new(identity, db.clone()),
            tasks: TaskStore::new(db),
        }
    }

    /// Build services over the backends selected by `config`.
    pub fn from_config(config: Config) -> Self {
        let (identity, db): (Arc<dyn IdentityProvider>, Arc<dyn RealtimeDatabase>) =
            if config.offline {
                tracing::warn!("Offline mode: using in-memory identity and database");
                (Arc::new(MemoryIdentity::new()), Arc::new(MemoryDb::new()))
            } else {
                (
                    Arc::new(FirebaseIdentity::new(&config.firebase_api_key)),
                    Arc::new(FirebaseRtdb::new(
                        &config.firebase_database_url,
                        config.firebase_database_secret.clone(),
                    )),
                )
            };
        Self::new(config, identity, db)
    }
}
