// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation store contract

use crate::StoreError;
use chrono::{DateTime, Utc};
use eb_core::{InstanceId, Operation, OperationEvent, OperationId};

/// Keyed persistence for operation records plus an append-only audit log
///
/// Implementations must make `update` an atomic compare-and-swap on
/// `Operation::version`.
pub trait OperationStore: Clone + Send + Sync + 'static {
    /// Read the latest committed copy of an operation
    fn get(&self, id: &OperationId) -> Result<Operation, StoreError>;

    /// Store a new operation; fails with `AlreadyExists` on a duplicate ID
    fn insert(&self, op: &Operation) -> Result<(), StoreError>;

    /// Replace the stored copy if its version equals `op.version`.
    ///
    /// Returns the committed copy with the version bumped. A stale version
    /// fails with `Conflict`; terminal records refuse all writes.
    fn update(&self, op: &Operation) -> Result<Operation, StoreError>;

    /// Non-terminal operations whose next attempt is at or before `before`,
    /// earliest first
    fn list_due(&self, before: DateTime<Utc>) -> Result<Vec<Operation>, StoreError>;

    /// Every operation for an instance, oldest first
    fn list_by_instance(&self, instance_id: &InstanceId) -> Result<Vec<Operation>, StoreError>;

    fn append_event(&self, event: &OperationEvent) -> Result<(), StoreError>;

    /// Audit events of one operation in append order
    fn events(&self, id: &OperationId) -> Result<Vec<OperationEvent>, StoreError>;
}

/// Validate `incoming` against the `stored` copy and produce the record to
/// commit. Shared by every store so the write rules cannot drift.
pub fn apply_update(stored: &Operation, incoming: &Operation) -> Result<Operation, StoreError> {
    if stored.is_terminal() {
        return Err(StoreError::Terminal(stored.id.clone()));
    }
    if stored.version != incoming.version {
        return Err(StoreError::Conflict {
            id: stored.id.clone(),
            expected: incoming.version,
            actual: stored.version,
        });
    }
    if !stored.state.can_transition_to(incoming.state) {
        return Err(StoreError::InvalidTransition {
            id: stored.id.clone(),
            from: stored.state,
            to: incoming.state,
        });
    }
    if incoming.step_index < stored.step_index {
        return Err(StoreError::Regression {
            id: stored.id.clone(),
            from: stored.step_index,
            to: incoming.step_index,
        });
    }

    let mut committed = incoming.clone();
    committed.version = stored.version + 1;
    Ok(committed)
}

/// Order due operations earliest-first, oldest-created as tie breaker
pub fn sort_due(ops: &mut [Operation]) {
    ops.sort_by(|a, b| {
        a.next_attempt_at
            .cmp(&b.next_attempt_at)
            .then_with(|| a.queue_key().cmp(&b.queue_key()))
    });
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
