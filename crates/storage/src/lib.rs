// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for operations, leases and the audit log
//!
//! The engine depends only on the `OperationStore` and `LeaseStore` traits.
//! Two implementations ship here: an in-memory reference store and a
//! directory-backed store that several processes can share.

mod error;
mod file;
mod lease;
mod memory;
mod store;
mod wal;

pub use error::StoreError;
pub use file::FileStore;
pub use lease::LeaseStore;
pub use memory::{MemoryLeaseStore, MemoryStore};
pub use store::{apply_update, sort_due, OperationStore};
pub use wal::{Wal, WalError};
