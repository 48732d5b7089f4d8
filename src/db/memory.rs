// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory realtime database.
//!
//! Holds the whole tree as one JSON value. Every mutation bumps a version on
//! a `watch` channel; subscribers re-read their path and emit a snapshot only
//! when it actually changed. Used for tests and offline mode.

use super::{RealtimeDatabase, SnapshotStream, StoreError};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;

/// In-memory JSON tree with change notification.
#[derive(Clone)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

struct Inner {
    root: RwLock<Value>,
    version: watch::Sender<u64>,
    push_counter: AtomicU64,
    offline: AtomicBool,
    read_latency: RwLock<Option<Duration>>,
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDb {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                root: RwLock::new(Value::Null),
                version,
                push_counter: AtomicU64::new(0),
                offline: AtomicBool::new(false),
                read_latency: RwLock::new(None),
            }),
        }
    }

    /// Make every operation fail with `Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every read by `latency` after the value has been captured.
    ///
    /// Widens the window between read and write so overlapping
    /// read-modify-write sequences can be reproduced in tests.
    pub fn set_read_latency(&self, latency: Option<Duration>) {
        if let Ok(mut guard) = self.inner.read_latency.write() {
            *guard = latency;
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.version.receiver_count()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "database offline".to_string(),
            ));
        }
        Ok(())
    }

    fn snapshot(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let root = self
            .inner
            .root
            .read()
            .map_err(|_| StoreError::Unknown("memory store poisoned".to_string()))?;
        Ok(lookup(&root, &segments(path)).cloned())
    }

    fn mutate(&self, path: &str, value: Option<Value>) -> Result<(), StoreError> {
        {
            let mut root = self
                .inner
                .root
                .write()
                .map_err(|_| StoreError::Unknown("memory store poisoned".to_string()))?;
            let segs = segments(path);
            match value.map(prune) {
                Some(v) if !is_empty(&v) => set(&mut root, &segs, v),
                _ => {
                    remove(&mut root, &segs);
                }
            }
        }
        self.inner.version.send_modify(|v| *v += 1);
        Ok(())
    }

    /// Time-ordered push key: fixed-width millis, then a sequence number.
    fn next_push_key(&self) -> String {
        let seq = self.inner.push_counter.fetch_add(1, Ordering::SeqCst);
        format!("-{:013}{:07}", crate::time_utils::now_millis(), seq % 10_000_000)
    }
}

#[async_trait]
impl RealtimeDatabase for MemoryDb {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.check_online()?;
        let value = self.snapshot(path)?;

        let latency = self.inner.read_latency.read().ok().and_then(|g| *g);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        Ok(value)
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        self.check_online()?;
        self.mutate(path, Some(value.clone()))
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String, StoreError> {
        self.check_online()?;
        let key = self.next_push_key();
        self.mutate(&format!("{}/{}", path, key), Some(value.clone()))?;
        Ok(key)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.mutate(path, None)
    }

    async fn subscribe(&self, path: &str) -> Result<SnapshotStream, StoreError> {
        self.check_online()?;

        let db = self.clone();
        let path = path.to_string();
        let mut rx = self.inner.version.subscribe();
        rx.mark_unchanged();
        let initial = self.snapshot(&path)?;

        let first = futures_util::stream::once(futures_util::future::ready(Ok(initial.clone())));
        let changes = futures_util::stream::unfold(
            (db, path, rx, initial),
            |(db, path, mut rx, mut last)| async move {
                loop {
                    // Sender lives as long as `db`, so this only fails on shutdown.
                    if rx.changed().await.is_err() {
                        return None;
                    }
                    match db.snapshot(&path) {
                        Ok(current) if current == last => continue,
                        Ok(current) => {
                            last = current.clone();
                            return Some((Ok(current), (db, path, rx, last)));
                        }
                        Err(e) => return Some((Err(e), (db, path, rx, last))),
                    }
                }
            },
        );

        Ok(first.chain(changes).boxed())
    }
}

// ─── Tree helpers ────────────────────────────────────────────

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn lookup<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = node.as_object()?.get(*seg)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// The hosted database does not store nulls, empty objects or empty arrays.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune).collect()),
        other => other,
    }
}

fn set(node: &mut Value, segs: &[&str], value: Value) {
    let Some((first, rest)) = segs.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.to_string()).or_insert(Value::Null);
        set(child, rest, value);
    }
}

/// Remove the node at `segs`, then drop any parents left empty.
/// Returns true when `node` itself became empty.
fn remove(node: &mut Value, segs: &[&str]) -> bool {
    let Some((first, rest)) = segs.split_first() else {
        *node = Value::Null;
        return true;
    };
    let Value::Object(map) = node else {
        return false;
    };
    let child_empty = match map.get_mut(*first) {
        Some(child) => remove(child, rest),
        None => false,
    };
    if child_empty {
        map.remove(*first);
    }
    if map.is_empty() {
        *node = Value::Null;
        return true;
    }
    false
}
