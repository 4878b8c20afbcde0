// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease store contract

use crate::StoreError;
use eb_core::HolderId;
use std::time::Duration;

/// Time-bounded mutual exclusion keyed by operation ID
///
/// `acquire` and `renew` return `Ok(false)` when the lease is held by
/// someone else; `Err` is reserved for the store itself failing.
pub trait LeaseStore: Clone + Send + Sync + 'static {
    fn acquire(&self, key: &str, holder: &HolderId, ttl: Duration) -> Result<bool, StoreError>;

    fn renew(&self, key: &str, holder: &HolderId, ttl: Duration) -> Result<bool, StoreError>;

    /// Release a lease held by `holder`; a no-op otherwise
    fn release(&self, key: &str, holder: &HolderId) -> Result<(), StoreError>;
}
