// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation ID generation

use crate::operation::OperationId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique operation identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next_id(&self) -> OperationId;
}

/// UUID-based generator for production use
///
/// Version 7 UUIDs sort by creation time, so operations created in the same
/// clock tick still queue in creation order.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next_id(&self) -> OperationId {
        OperationId::new(uuid::Uuid::now_v7().to_string())
    }
}

/// Digits in a sequential ID; keeps string order equal to numeric order
const SEQUENCE_WIDTH: usize = 6;

/// Sequential generator for deterministic tests ("op-000001", "op-000002", ...)
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("op")
    }
}

impl IdGen for SequentialIdGen {
    fn next_id(&self) -> OperationId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        OperationId::new(format!("{}-{:0width$}", self.prefix, n, width = SEQUENCE_WIDTH))
    }
}
