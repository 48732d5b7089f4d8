// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod identity;
pub mod memory_identity;
pub mod tasks;

pub use accounts::{AccountError, AccountManager};
pub use identity::{FirebaseIdentity, IdentityError, IdentityProvider};
pub use memory_identity::MemoryIdentity;
pub use tasks::{TaskStore, TaskStream};
