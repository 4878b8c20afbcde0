// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use eb_core::{InstanceId, OperationId, PlanError};
use eb_storage::StoreError;
use thiserror::Error;

/// Errors from the operation manager
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Someone else wrote first; re-read and re-evaluate
    #[error("version conflict on operation {0}")]
    Conflict(OperationId),
    /// The operation reached a terminal state in the meantime
    #[error("operation {0} is already terminal")]
    Terminal(OperationId),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl ManagerError {
    /// Lost a race with another writer; the stored copy is authoritative
    pub fn is_lost_race(&self) -> bool {
        matches!(self, ManagerError::Conflict(_) | ManagerError::Terminal(_))
    }
}

impl From<StoreError> for ManagerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id, .. } => ManagerError::Conflict(id),
            StoreError::Terminal(id) => ManagerError::Terminal(id),
            other => ManagerError::Store(other),
        }
    }
}

/// Errors that abort a worker cycle. The operation itself is left untouched
/// and picked up again on a later poll.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("manager error: {0}")]
    Manager(#[from] ManagerError),
}

/// Errors returned to facade callers
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("instance not found: {0}")]
    InstanceNotFound(InstanceId),
    #[error("operation not found: {0}")]
    OperationNotFound(OperationId),
    #[error("operation {0} is already finished")]
    AlreadyFinished(OperationId),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("manager error: {0}")]
    Manager(#[from] ManagerError),
}

impl From<StoreError> for BrokerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => BrokerError::OperationNotFound(id),
            other => BrokerError::Store(other),
        }
    }
}
