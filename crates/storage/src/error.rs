// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors

use crate::wal::WalError;
use eb_core::{OperationId, OperationState};
use thiserror::Error;

/// Errors returned by operation and lease stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("operation not found: {0}")]
    NotFound(OperationId),
    #[error("operation already exists: {0}")]
    AlreadyExists(OperationId),
    #[error("version conflict on {id}: expected {expected}, stored {actual}")]
    Conflict {
        id: OperationId,
        expected: u64,
        actual: u64,
    },
    #[error("operation {0} is terminal")]
    Terminal(OperationId),
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: OperationId,
        from: OperationState,
        to: OperationState,
    },
    #[error("step index of {id} would regress from {from} to {to}")]
    Regression { id: OperationId, from: usize, to: usize },
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("audit log error: {0}")]
    Wal(#[from] WalError),
}

impl StoreError {
    /// Another writer got there first; re-read and re-evaluate
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// The backing storage itself failed, not the request
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Io(_) | StoreError::Json(_) | StoreError::Wal(_)
        )
    }
}
