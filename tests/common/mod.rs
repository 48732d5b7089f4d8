// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use std::sync::Arc;
use todoboard::config::Config;
use todoboard::db::MemoryDb;
use todoboard::middleware::auth::create_jwt;
use todoboard::models::SessionUser;
use todoboard::routes::create_router;
use todoboard::services::{AccountManager, MemoryIdentity, TaskStore};
use todoboard::AppState;

/// In-memory backends shared by a test, kept so tests can poke at them.
#[allow(dead_code)]
pub struct TestBackends {
    pub identity: Arc<MemoryIdentity>,
    pub db: MemoryDb,
}

#[allow(dead_code)]
pub fn backends() -> TestBackends {
    TestBackends {
        identity: Arc::new(MemoryIdentity::new()),
        db: MemoryDb::new(),
    }
}

/// Task store over a fresh in-memory database.
#[allow(dead_code)]
pub fn task_store() -> (TaskStore, MemoryDb) {
    let db = MemoryDb::new();
    (TaskStore::new(Arc::new(db.clone())), db)
}

/// Account manager over fresh in-memory backends.
#[allow(dead_code)]
pub fn account_manager() -> (AccountManager, TestBackends) {
    let b = backends();
    let manager = AccountManager::new(b.identity.clone(), Arc::new(b.db.clone()));
    (manager, b)
}

/// Create a test app with offline in-memory dependencies.
/// Returns the router, the shared state and the backends.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TestBackends) {
    let b = backends();
    let state = Arc::new(AppState::new(
        Config::test_default(),
        b.identity.clone(),
        Arc::new(b.db.clone()),
    ));
    (create_router(state.clone()), state, b)
}

/// Session token for a user, signed with the test key.
#[allow(dead_code)]
pub fn test_token(uid: &str, name: &str) -> String {
    let user = SessionUser {
        uid: uid.to_string(),
        email: format!("{}@example.com", uid),
        display_name: Some(name.to_string()),
        id_token: None,
    };
    create_jwt(&user, &Config::test_default().jwt_signing_key).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
