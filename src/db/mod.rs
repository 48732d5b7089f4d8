// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (hosted realtime tree database).
//!
//! Services talk to the database only through [`RealtimeDatabase`], so the
//! hosted REST client and the in-memory store are interchangeable.

pub mod memory;
pub mod rest;

pub use memory::MemoryDb;
pub use rest::FirebaseRtdb;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;
use tokio::task::JoinHandle;

/// Database error, tagged by kind so callers can tell retryable failures
/// from terminal ones.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Unknown(String),
}

impl StoreError {
    /// Only transport-level failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// Stream of full snapshots at a path: the current value first, then one
/// item per change. `None` means the path is empty.
pub type SnapshotStream = BoxStream<'static, Result<Option<Value>, StoreError>>;

/// Path-addressed JSON tree store with change subscriptions.
#[async_trait]
pub trait RealtimeDatabase: Send + Sync {
    /// Read the value at `path`; `None` when nothing is stored there.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value at `path`.
    async fn write(&self, path: &str, value: &Value) -> Result<(), StoreError>;

    /// Store `value` under a new generated child key of `path`.
    /// Keys sort in creation order.
    async fn push(&self, path: &str, value: &Value) -> Result<String, StoreError>;

    /// Delete the value at `path` and everything below it.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Subscribe to snapshots of `path`.
    async fn subscribe(&self, path: &str) -> Result<SnapshotStream, StoreError>;
}

/// Database paths.
pub mod paths {
    use super::StoreError;

    pub const USERS: &str = "users";
    /// Per-user task subtrees: `tasks/{userId}/{taskId}`
    pub const TASKS: &str = "tasks";

    /// Reject keys the hosted database cannot store, and anything that
    /// would escape its parent path.
    pub fn validate_key(key: &str) -> Result<&str, StoreError> {
        const FORBIDDEN: &[char] = &['.', '$', '#', '[', ']', '/'];

        if key.is_empty() || key.len() > 768 || key.contains(FORBIDDEN) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        if key.chars().any(char::is_control) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(key)
    }

    pub fn user(uid: &str) -> Result<String, StoreError> {
        Ok(format!("{}/{}", USERS, validate_key(uid)?))
    }

    pub fn user_tasks(user_id: &str) -> Result<String, StoreError> {
        Ok(format!("{}/{}", TASKS, validate_key(user_id)?))
    }

    pub fn task(user_id: &str, task_id: &str) -> Result<String, StoreError> {
        Ok(format!(
            "{}/{}/{}",
            TASKS,
            validate_key(user_id)?,
            validate_key(task_id)?
        ))
    }
}

/// Handle to a live subscription.
///
/// The background task feeding the subscriber is aborted when the handle is
/// dropped, so a subscription never outlives its owner.
pub struct Subscription {
    path: String,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn new(path: String, task: JoinHandle<()>) -> Self {
        Self { path, task }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// False once the backend has closed the stream.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop receiving updates.
    pub fn unsubscribe(self) {
        tracing::debug!(path = %self.path, "Unsubscribing");
        // Drop aborts the task.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_path() {
        assert_eq!(paths::task("u1", "-Nabc").unwrap(), "tasks/u1/-Nabc");
        assert_eq!(paths::user("u1").unwrap(), "users/u1");
    }

    #[test]
    fn test_rejects_path_escaping_keys() {
        for bad in ["", "a/b", "..", "a.b", "x#", "a[0]", "$priority", "a\nb"] {
            assert!(
                matches!(paths::validate_key(bad), Err(StoreError::InvalidKey(_))),
                "key {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(StoreError::Unavailable("timeout".into()).is_retryable());
        assert!(!StoreError::NotFound("x".into()).is_retryable());
        assert!(!StoreError::PermissionDenied("x".into()).is_retryable());
        assert!(!StoreError::Unknown("x".into()).is_retryable());
    }
}
