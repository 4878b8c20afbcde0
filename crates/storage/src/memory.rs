// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reference stores
//!
//! Cloning shares the underlying state, so every worker in a test sees the
//! same records. An outage switch lets tests exercise infrastructure failures.

use crate::store::{apply_update, sort_due};
use crate::{LeaseStore, OperationStore, StoreError};
use chrono::{DateTime, Utc};
use eb_core::{
    Clock, HolderId, InstanceId, Lease, LeaseDecision, LeaseInput, Operation, OperationEvent,
    OperationId, SystemClock,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct MemoryState {
    operations: BTreeMap<OperationId, Operation>,
    events: Vec<OperationEvent>,
}

/// In-memory operation store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a storage outage: every call fails with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored operations
    pub fn len(&self) -> usize {
        self.lock().operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl OperationStore for MemoryStore {
    fn get(&self, id: &OperationId) -> Result<Operation, StoreError> {
        self.check_available()?;
        self.lock()
            .operations
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn insert(&self, op: &Operation) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.lock();
        if state.operations.contains_key(&op.id) {
            return Err(StoreError::AlreadyExists(op.id.clone()));
        }
        state.operations.insert(op.id.clone(), op.clone());
        Ok(())
    }

    fn update(&self, op: &Operation) -> Result<Operation, StoreError> {
        self.check_available()?;
        let mut state = self.lock();
        let stored = state
            .operations
            .get(&op.id)
            .ok_or_else(|| StoreError::NotFound(op.id.clone()))?;
        let committed = apply_update(stored, op)?;
        state.operations.insert(op.id.clone(), committed.clone());
        Ok(committed)
    }

    fn list_due(&self, before: DateTime<Utc>) -> Result<Vec<Operation>, StoreError> {
        self.check_available()?;
        let mut due: Vec<_> = self
            .lock()
            .operations
            .values()
            .filter(|op| op.is_due(before))
            .cloned()
            .collect();
        sort_due(&mut due);
        Ok(due)
    }

    fn list_by_instance(&self, instance_id: &InstanceId) -> Result<Vec<Operation>, StoreError> {
        self.check_available()?;
        let mut ops: Vec<_> = self
            .lock()
            .operations
            .values()
            .filter(|op| &op.instance_id == instance_id)
            .cloned()
            .collect();
        ops.sort_by(|a, b| a.queue_key().cmp(&b.queue_key()));
        Ok(ops)
    }

    fn append_event(&self, event: &OperationEvent) -> Result<(), StoreError> {
        self.check_available()?;
        self.lock().events.push(event.clone());
        Ok(())
    }

    fn events(&self, id: &OperationId) -> Result<Vec<OperationEvent>, StoreError> {
        self.check_available()?;
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|e| &e.operation_id == id)
            .cloned()
            .collect())
    }
}

/// In-memory lease store
#[derive(Clone)]
pub struct MemoryLeaseStore<C: Clock = SystemClock> {
    leases: Arc<Mutex<HashMap<String, Lease>>>,
    clock: C,
    unavailable: Arc<AtomicBool>,
}

impl MemoryLeaseStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryLeaseStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryLeaseStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
            clock,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate a lease backend outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current holder of an unexpired lease
    pub fn holder(&self, key: &str) -> Option<HolderId> {
        let now = self.clock.now();
        let leases = self.leases.lock().unwrap_or_else(|e| e.into_inner());
        leases
            .get(key)
            .filter(|lease| !lease.is_available(now))
            .and_then(|lease| lease.holder().cloned())
    }

    fn apply(&self, key: &str, input: LeaseInput) -> Result<LeaseDecision, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("lease store offline".to_string()));
        }
        let mut leases = self.leases.lock().unwrap_or_else(|e| e.into_inner());
        let current = leases.get(key).cloned().unwrap_or_else(|| Lease::new(key));
        let (next, decision) = current.transition(input, self.clock.now());
        match &decision {
            LeaseDecision::Denied { .. } | LeaseDecision::Ignored => {}
            LeaseDecision::Released => {
                leases.remove(key);
            }
            LeaseDecision::Reclaimed { previous } => {
                tracing::warn!(key, previous = %previous, "reclaimed expired lease");
                leases.insert(key.to_string(), next);
            }
            _ => {
                leases.insert(key.to_string(), next);
            }
        }
        Ok(decision)
    }
}

impl<C: Clock> LeaseStore for MemoryLeaseStore<C> {
    fn acquire(&self, key: &str, holder: &HolderId, ttl: Duration) -> Result<bool, StoreError> {
        let decision = self.apply(
            key,
            LeaseInput::Acquire {
                holder: holder.clone(),
                ttl,
            },
        )?;
        Ok(decision.is_held())
    }

    fn renew(&self, key: &str, holder: &HolderId, ttl: Duration) -> Result<bool, StoreError> {
        let decision = self.apply(
            key,
            LeaseInput::Renew {
                holder: holder.clone(),
                ttl,
            },
        )?;
        Ok(decision.is_held())
    }

    fn release(&self, key: &str, holder: &HolderId) -> Result<(), StoreError> {
        self.apply(
            key,
            LeaseInput::Release {
                holder: holder.clone(),
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
