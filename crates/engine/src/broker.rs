// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker facade
//!
//! Turns caller requests into pending operations and answers status
//! queries from the persisted records. It never runs steps; workers pick
//! the operations up from the store.

use crate::error::BrokerError;
use crate::manager::OperationManager;
use eb_core::{
    Clock, EventKind, FailureKind, IdGen, InstanceId, Operation, OperationEvent, OperationId,
    OperationKind, OperationState, PlanCatalog, ProvisionRequest, ProvisioningParameters,
};
use eb_storage::OperationStore;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Attempts at superseding before giving up on a busy operation
const SUPERSEDE_ATTEMPTS: usize = 3;

/// Start provisioning an instance
pub trait Provisioner {
    fn provision(
        &self,
        instance_id: &InstanceId,
        request: &ProvisionRequest,
    ) -> Result<OperationId, BrokerError>;
}

/// Remove a provisioned instance
pub trait Deprovisioner {
    fn deprovision(&self, instance_id: &InstanceId) -> Result<OperationId, BrokerError>;
}

/// Change an existing instance
pub trait Updater {
    fn update(
        &self,
        instance_id: &InstanceId,
        request: &ProvisionRequest,
    ) -> Result<OperationId, BrokerError>;
}

/// Read the last durable state of an operation
pub trait StatusReader {
    fn last_operation(&self, operation_id: &OperationId) -> Result<StatusReport, BrokerError>;
}

/// Caller-facing view of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub operation_id: OperationId,
    pub instance_id: InstanceId,
    pub kind: OperationKind,
    pub state: OperationState,
    pub last_error: Option<String>,
    pub failure: Option<FailureKind>,
    pub step_index: usize,
    pub attempts: u32,
    pub description: String,
}

impl From<&Operation> for StatusReport {
    fn from(op: &Operation) -> Self {
        Self {
            operation_id: op.id.clone(),
            instance_id: op.instance_id.clone(),
            kind: op.kind,
            state: op.state,
            last_error: op.last_error.clone(),
            failure: op.failure,
            step_index: op.step_index,
            attempts: op.attempts,
            description: describe(op),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<12} {:<12} {}",
            self.operation_id.to_string(),
            self.kind.to_string(),
            self.state.to_string(),
            self.description
        )
    }
}

fn describe(op: &Operation) -> String {
    match op.state {
        OperationState::Pending => format!("{} queued", op.kind),
        OperationState::InProgress => format!("{} in progress at step {}", op.kind, op.step_index),
        OperationState::Retrying => match &op.last_error {
            Some(reason) => format!("{} waiting to retry step {}: {}", op.kind, op.step_index, reason),
            None => format!("{} waiting to retry step {}", op.kind, op.step_index),
        },
        OperationState::Succeeded => format!("{} succeeded", op.kind),
        OperationState::Failed => match (&op.failure, &op.last_error) {
            (Some(failure), Some(reason)) => format!("{} failed ({}): {}", op.kind, failure, reason),
            (_, Some(reason)) => format!("{} failed: {}", op.kind, reason),
            _ => format!("{} failed", op.kind),
        },
    }
}

/// Request-facing entry point backed by an operation store
#[derive(Clone)]
pub struct Broker<S, C, I> {
    store: S,
    clock: C,
    ids: I,
    catalog: Arc<PlanCatalog>,
    manager: OperationManager<S, C>,
}

impl<S, C, I> Broker<S, C, I>
where
    S: OperationStore,
    C: Clock,
    I: IdGen,
{
    pub fn new(store: S, clock: C, ids: I, catalog: Arc<PlanCatalog>) -> Self {
        let manager = OperationManager::new(store.clone(), clock.clone());
        Self {
            store,
            clock,
            ids,
            catalog,
            manager,
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Persist a pending operation.
    ///
    /// Repeating a request whose operation is still running returns the
    /// existing operation instead of queueing a duplicate.
    pub fn create_operation(
        &self,
        instance_id: &InstanceId,
        kind: OperationKind,
        parameters: ProvisioningParameters,
    ) -> Result<OperationId, BrokerError> {
        let existing = self.store.list_by_instance(instance_id)?;
        if let Some(op) = existing
            .iter()
            .find(|op| !op.is_terminal() && op.kind == kind && op.parameters == parameters)
        {
            tracing::info!(
                operation_id = %op.id,
                instance_id = %instance_id,
                %kind,
                "request matches a running operation"
            );
            return Ok(op.id.clone());
        }

        let op = Operation::new(
            self.ids.next_id(),
            instance_id.clone(),
            kind,
            parameters,
            self.clock.now(),
        );
        self.store.insert(&op)?;

        let event = OperationEvent::new(
            op.id.clone(),
            op.created_at,
            op.version,
            EventKind::Created {
                instance_id: instance_id.to_string(),
                kind: kind.to_string(),
            },
        );
        if let Err(e) = self.store.append_event(&event) {
            tracing::warn!(operation_id = %op.id, error = %e, "failed to append audit event");
        }

        let queued_behind = existing.iter().filter(|o| !o.is_terminal()).count();
        tracing::info!(
            operation_id = %op.id,
            instance_id = %instance_id,
            %kind,
            queued_behind,
            "operation created"
        );
        Ok(op.id)
    }

    /// Every operation of an instance, oldest first
    pub fn list(&self, instance_id: &InstanceId) -> Result<Vec<StatusReport>, BrokerError> {
        let ops = self.store.list_by_instance(instance_id)?;
        Ok(ops.iter().map(StatusReport::from).collect())
    }

    /// Audit trail of an operation
    pub fn events(&self, operation_id: &OperationId) -> Result<Vec<OperationEvent>, BrokerError> {
        // Distinguish an unknown operation from one without events
        self.store.get(operation_id)?;
        Ok(self.store.events(operation_id)?)
    }

    /// Abandon a non-terminal operation so the ones queued behind it can run.
    ///
    /// A worker may be writing the same record; on a version conflict the
    /// fresh copy is re-read and the supersede retried.
    pub fn supersede(
        &self,
        operation_id: &OperationId,
        reason: &str,
    ) -> Result<StatusReport, BrokerError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let op = self.store.get(operation_id)?;
            if op.is_terminal() {
                return Err(BrokerError::AlreadyFinished(operation_id.clone()));
            }
            match self.manager.supersede(&op, reason) {
                Ok(committed) => return Ok(StatusReport::from(&committed.op)),
                Err(e) if e.is_lost_race() && attempt < SUPERSEDE_ATTEMPTS => {
                    tracing::debug!(operation_id = %operation_id, attempt, "supersede raced a worker, retrying");
                }
                Err(e) if e.is_lost_race() => {
                    // Terminal now, or still contended after every attempt
                    let current = self.store.get(operation_id)?;
                    if current.is_terminal() {
                        return Err(BrokerError::AlreadyFinished(operation_id.clone()));
                    }
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Parameters of the instance's most recent provision
    fn provisioned_parameters(
        &self,
        instance_id: &InstanceId,
    ) -> Result<ProvisioningParameters, BrokerError> {
        self.store
            .list_by_instance(instance_id)?
            .into_iter()
            .rev()
            .find(|op| op.kind == OperationKind::Provision)
            .map(|op| op.parameters)
            .ok_or_else(|| BrokerError::InstanceNotFound(instance_id.clone()))
    }
}

impl<S: OperationStore, C: Clock, I: IdGen> Provisioner for Broker<S, C, I> {
    fn provision(
        &self,
        instance_id: &InstanceId,
        request: &ProvisionRequest,
    ) -> Result<OperationId, BrokerError> {
        let parameters = self.catalog.resolve(request)?;
        self.create_operation(instance_id, OperationKind::Provision, parameters)
    }
}

impl<S: OperationStore, C: Clock, I: IdGen> Deprovisioner for Broker<S, C, I> {
    fn deprovision(&self, instance_id: &InstanceId) -> Result<OperationId, BrokerError> {
        let parameters = self.provisioned_parameters(instance_id)?;
        self.create_operation(instance_id, OperationKind::Deprovision, parameters)
    }
}

impl<S: OperationStore, C: Clock, I: IdGen> Updater for Broker<S, C, I> {
    fn update(
        &self,
        instance_id: &InstanceId,
        request: &ProvisionRequest,
    ) -> Result<OperationId, BrokerError> {
        self.provisioned_parameters(instance_id)?;
        let parameters = self.catalog.resolve(request)?;
        self.create_operation(instance_id, OperationKind::Update, parameters)
    }
}

impl<S: OperationStore, C: Clock, I: IdGen> StatusReader for Broker<S, C, I> {
    fn last_operation(&self, operation_id: &OperationId) -> Result<StatusReport, BrokerError> {
        let op = self.store.get(operation_id)?;
        Ok(StatusReport::from(&op))
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
