// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for epoch-millisecond timestamps.

use chrono::Utc;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for a write that follows `previous`.
///
/// Never returns a value <= `previous`, so `updatedAt` strictly advances even
/// when two writes land in the same millisecond.
pub fn stamp_after(previous: i64) -> i64 {
    now_millis().max(previous.saturating_add(1))
}
