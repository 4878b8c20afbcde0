// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steps that talk to the provisioning backend
//!
//! Each one checks remote state before acting so that replaying it after a
//! crash has the same effect as running it once.

use super::backend_outcome;
use crate::step::Step;
use async_trait::async_trait;
use eb_adapters::{ProvisionerClient, ProvisionerError, RuntimeInput, RuntimeStatus};
use eb_core::{Operation, StepOutcome};
use std::time::Duration;

/// Create the runtime, or adopt one that already exists for the instance
pub struct CreateRuntimeStep<P> {
    client: P,
    poll: Duration,
}

impl<P> CreateRuntimeStep<P> {
    pub fn new(client: P, poll: Duration) -> Self {
        Self { client, poll }
    }
}

#[async_trait]
impl<P: ProvisionerClient> Step for CreateRuntimeStep<P> {
    fn name(&self) -> &str {
        "create_runtime"
    }

    async fn run(&self, mut op: Operation) -> (Operation, StepOutcome) {
        if op.runtime_id.is_some() {
            return (op, StepOutcome::Done);
        }
        if !op.input.is_initialized() {
            return (op, StepOutcome::fail("runtime input is not initialised"));
        }

        match self.client.find_runtime(&op.instance_id).await {
            Ok(Some(existing)) => {
                tracing::info!(
                    operation_id = %op.id,
                    runtime_id = %existing.id,
                    "adopting existing runtime"
                );
                op.runtime_id = Some(existing.id);
                return (op, StepOutcome::Done);
            }
            Ok(None) => {}
            Err(e) => {
                let outcome = backend_outcome(&e, self.poll);
                return (op, outcome);
            }
        }

        let input = RuntimeInput::from(&op.input);
        match self.client.create_runtime(&op.instance_id, &input).await {
            Ok(runtime_id) => {
                op.runtime_id = Some(runtime_id);
                (op, StepOutcome::Done)
            }
            Err(e) => {
                let outcome = backend_outcome(&e, self.poll);
                (op, outcome)
            }
        }
    }
}

/// Poll until the recorded runtime is ready
pub struct AwaitRuntimeStep<P> {
    client: P,
    poll: Duration,
}

impl<P> AwaitRuntimeStep<P> {
    pub fn new(client: P, poll: Duration) -> Self {
        Self { client, poll }
    }
}

#[async_trait]
impl<P: ProvisionerClient> Step for AwaitRuntimeStep<P> {
    fn name(&self) -> &str {
        "await_runtime"
    }

    async fn run(&self, op: Operation) -> (Operation, StepOutcome) {
        let Some(runtime_id) = op.runtime_id.clone() else {
            return (op, StepOutcome::fail("no runtime recorded"));
        };

        let outcome = match self.client.runtime_status(&runtime_id).await {
            Ok(RuntimeStatus::Ready) => StepOutcome::Done,
            Ok(status @ (RuntimeStatus::Provisioning | RuntimeStatus::Upgrading)) => {
                StepOutcome::retry_because(
                    self.poll,
                    format!("runtime {} is {}", runtime_id, status.name()),
                )
            }
            Ok(RuntimeStatus::Failed { reason }) => {
                StepOutcome::fail(format!("runtime {} failed: {}", runtime_id, reason))
            }
            Ok(RuntimeStatus::Deprovisioning) => {
                StepOutcome::fail(format!("runtime {} is being deprovisioned", runtime_id))
            }
            Err(e) => backend_outcome(&e, self.poll),
        };
        (op, outcome)
    }
}

/// Push the current input to an existing runtime
pub struct UpgradeRuntimeStep<P> {
    client: P,
    poll: Duration,
}

impl<P> UpgradeRuntimeStep<P> {
    pub fn new(client: P, poll: Duration) -> Self {
        Self { client, poll }
    }
}

#[async_trait]
impl<P: ProvisionerClient> Step for UpgradeRuntimeStep<P> {
    fn name(&self) -> &str {
        "upgrade_runtime"
    }

    async fn run(&self, mut op: Operation) -> (Operation, StepOutcome) {
        let (runtime_id, status) = match op.runtime_id.clone() {
            Some(id) => match self.client.runtime_status(&id).await {
                Ok(status) => (id, status),
                Err(e) => {
                    let outcome = backend_outcome(&e, self.poll);
                    return (op, outcome);
                }
            },
            None => match self.client.find_runtime(&op.instance_id).await {
                Ok(Some(existing)) => (existing.id, existing.status),
                Ok(None) => {
                    let reason = format!("no runtime found for instance {}", op.instance_id);
                    return (op, StepOutcome::Fail(reason));
                }
                Err(e) => {
                    let outcome = backend_outcome(&e, self.poll);
                    return (op, outcome);
                }
            },
        };
        op.runtime_id = Some(runtime_id.clone());

        // A replayed step after a crash finds its own upgrade still running
        if status == RuntimeStatus::Upgrading {
            tracing::info!(
                operation_id = %op.id,
                runtime_id = %runtime_id,
                "upgrade already in progress"
            );
            return (op, StepOutcome::Done);
        }

        let input = RuntimeInput::from(&op.input);
        let outcome = match self.client.upgrade_runtime(&runtime_id, &input).await {
            Ok(()) => StepOutcome::Done,
            Err(e) => backend_outcome(&e, self.poll),
        };
        (op, outcome)
    }
}

/// Request removal of the instance's runtime, if any
pub struct DeprovisionRuntimeStep<P> {
    client: P,
    poll: Duration,
}

impl<P> DeprovisionRuntimeStep<P> {
    pub fn new(client: P, poll: Duration) -> Self {
        Self { client, poll }
    }
}

#[async_trait]
impl<P: ProvisionerClient> Step for DeprovisionRuntimeStep<P> {
    fn name(&self) -> &str {
        "deprovision_runtime"
    }

    async fn run(&self, mut op: Operation) -> (Operation, StepOutcome) {
        let runtime = match self.client.find_runtime(&op.instance_id).await {
            Ok(Some(runtime)) => runtime,
            Ok(None) => {
                tracing::info!(operation_id = %op.id, "no runtime to remove");
                return (op, StepOutcome::Done);
            }
            Err(e) => {
                let outcome = backend_outcome(&e, self.poll);
                return (op, outcome);
            }
        };

        op.runtime_id = Some(runtime.id.clone());
        if runtime.status == RuntimeStatus::Deprovisioning {
            return (op, StepOutcome::Done);
        }
        let outcome = match self.client.deprovision_runtime(&runtime.id).await {
            Ok(()) | Err(ProvisionerError::NotFound(_)) => StepOutcome::Done,
            Err(e) => backend_outcome(&e, self.poll),
        };
        (op, outcome)
    }
}

/// Poll until the runtime is gone
pub struct AwaitRuntimeRemovedStep<P> {
    client: P,
    poll: Duration,
}

impl<P> AwaitRuntimeRemovedStep<P> {
    pub fn new(client: P, poll: Duration) -> Self {
        Self { client, poll }
    }
}

#[async_trait]
impl<P: ProvisionerClient> Step for AwaitRuntimeRemovedStep<P> {
    fn name(&self) -> &str {
        "await_runtime_removed"
    }

    async fn run(&self, op: Operation) -> (Operation, StepOutcome) {
        let Some(runtime_id) = op.runtime_id.clone() else {
            return (op, StepOutcome::Done);
        };
        let outcome = match self.client.runtime_status(&runtime_id).await {
            Err(ProvisionerError::NotFound(_)) => StepOutcome::Done,
            Ok(_) => StepOutcome::retry_because(
                self.poll,
                format!("runtime {} is still being removed", runtime_id),
            ),
            Err(e) => backend_outcome(&e, self.poll),
        };
        (op, outcome)
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
