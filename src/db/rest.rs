// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Realtime Database REST client.
//!
//! Every path maps to `{database_url}/{path}.json`. Live updates use the
//! REST streaming endpoint (`Accept: text/event-stream`); on each `put` or
//! `patch` event the whole path is re-read so subscribers always receive a
//! full snapshot.

use super::{RealtimeDatabase, SnapshotStream, StoreError};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;

/// Firebase Realtime Database client.
#[derive(Clone)]
pub struct FirebaseRtdb {
    http: reqwest::Client,
    base_url: String,
    /// Database secret or OAuth token appended as `?auth=`
    auth: Option<String>,
}

/// Response body of a push (`POST`).
#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseRtdb {
    /// Create a client for `database_url`, e.g.
    /// `https://my-app-default-rtdb.firebaseio.com`.
    pub fn new(database_url: &str, auth: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: database_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        let mut url = format!("{}/{}.json", self.base_url, path);
        if let Some(auth) = &self.auth {
            url.push_str("?auth=");
            url.push_str(&urlencoding::encode(auth));
        }
        url
    }

    /// Check response status and map failures onto error kinds.
    async fn check_response(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(path, status = status.as_u16(), body = %body, "Database request failed");

        Err(match status.as_u16() {
            401 | 403 => StoreError::PermissionDenied(format!("{}: {}", path, body.trim())),
            404 => StoreError::NotFound(path.to_string()),
            429 | 500..=599 => StoreError::Unavailable(format!("HTTP {}", status)),
            _ => StoreError::Unknown(format!("HTTP {}: {}", status, body.trim())),
        })
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl RealtimeDatabase for FirebaseRtdb {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(transport_error)?;
        let response = self.check_response(path, response).await?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        let response = self
            .http
            .put(self.url(path))
            .json(value)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response(path, response).await?;
        Ok(())
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String, StoreError> {
        let response = self
            .http
            .post(self.url(path))
            .json(value)
            .send()
            .await
            .map_err(transport_error)?;
        let response = self.check_response(path, response).await?;

        let pushed: PushResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(pushed.name)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.url(path))
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response(path, response).await?;
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<SnapshotStream, StoreError> {
        let response = self
            .http
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(transport_error)?;
        let response = self.check_response(path, response).await?;

        tracing::debug!(path, "Opened database event stream");

        let state = EventStreamState {
            body: response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                .boxed(),
            buffer: Vec::new(),
            db: self.clone(),
            path: path.to_string(),
            closed: false,
        };

        Ok(futures_util::stream::unfold(state, next_snapshot).boxed())
    }
}

// ─── Event stream ────────────────────────────────────────────

/// One server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

/// Parse one event block (the text between blank lines).
pub fn parse_event_block(block: &str) -> Option<ServerEvent> {
    let mut event = None;
    let mut data = Vec::new();

    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.trim_start());
        }
    }

    event.map(|event| ServerEvent {
        event,
        data: data.join("\n"),
    })
}

struct EventStreamState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: Vec<u8>,
    db: FirebaseRtdb,
    path: String,
    closed: bool,
}

impl EventStreamState {
    /// Append a body chunk. `\r` is dropped so CRLF-delimited streams split
    /// on blank lines too, even when a `\r\n` straddles two chunks.
    fn push_chunk(&mut self, bytes: &[u8]) {
        self.buffer
            .extend(bytes.iter().copied().filter(|&b| b != b'\r'));
    }

    fn take_event(&mut self) -> Option<ServerEvent> {
        loop {
            let end = self.buffer.windows(2).position(|w| w == b"\n\n")?;
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&block);
            if let Some(event) = parse_event_block(&text) {
                return Some(event);
            }
        }
    }
}

async fn next_snapshot(
    mut state: EventStreamState,
) -> Option<(Result<Option<Value>, StoreError>, EventStreamState)> {
    loop {
        if state.closed {
            return None;
        }

        while let Some(event) = state.take_event() {
            match event.event.as_str() {
                "put" | "patch" => {
                    let snapshot = state.db.read(&state.path).await;
                    return Some((snapshot, state));
                }
                "keep-alive" => {}
                "cancel" | "auth_revoked" => {
                    tracing::warn!(path = %state.path, event = %event.event, "Database closed event stream");
                    state.closed = true;
                    let err = StoreError::PermissionDenied(format!(
                        "{}: {}",
                        event.event, event.data
                    ));
                    return Some((Err(err), state));
                }
                other => {
                    tracing::debug!(event = other, "Ignoring unknown stream event");
                }
            }
        }

        match state.body.next().await {
            Some(Ok(bytes)) => state.push_chunk(&bytes),
            Some(Err(e)) => {
                state.closed = true;
                return Some((Err(transport_error(e)), state));
            }
            None => return None,
        }
    }
}
