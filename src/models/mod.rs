// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod task;
pub mod user;

pub use task::{Comment, Priority, TaskUpdate, TodoTask};
pub use user::{SessionUser, UserProfile};
