// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning steps and the default pipelines built from them

mod components;
mod input;
mod runtime;
mod validate;

pub use components::{EnableComponentStep, OptionalComponentsStep};
pub use input::InitInputStep;
pub use runtime::{
    AwaitRuntimeRemovedStep, AwaitRuntimeStep, CreateRuntimeStep, DeprovisionRuntimeStep,
    UpgradeRuntimeStep,
};
pub use validate::ValidateParametersStep;

use crate::pipeline::{PipelineRegistry, StepPipeline};
use eb_adapters::{ProvisionerClient, ProvisionerError};
use eb_core::{OperationKind, PlanCatalog, StepOutcome};
use std::sync::Arc;
use std::time::Duration;

/// Eventing component every runtime gets
pub const KNATIVE_NATSS_COMPONENT: &str = "KnativeProvisionerNatss";

/// Provision, deprovision and update pipelines against `client`
pub fn default_registry<P: ProvisionerClient>(
    client: P,
    catalog: Arc<PlanCatalog>,
    status_poll_interval: Duration,
) -> PipelineRegistry {
    let provision = StepPipeline::new(OperationKind::Provision)
        .with_step(ValidateParametersStep::new(catalog.clone()))
        .with_step(InitInputStep::new(catalog.clone()))
        .with_step(EnableComponentStep::new(KNATIVE_NATSS_COMPONENT))
        .with_step(OptionalComponentsStep::new(catalog.clone()))
        .with_step(CreateRuntimeStep::new(client.clone(), status_poll_interval))
        .with_step(AwaitRuntimeStep::new(client.clone(), status_poll_interval));

    let deprovision = StepPipeline::new(OperationKind::Deprovision)
        .with_step(DeprovisionRuntimeStep::new(client.clone(), status_poll_interval))
        .with_step(AwaitRuntimeRemovedStep::new(client.clone(), status_poll_interval));

    let update = StepPipeline::new(OperationKind::Update)
        .with_step(ValidateParametersStep::new(catalog.clone()))
        .with_step(InitInputStep::new(catalog.clone()))
        .with_step(OptionalComponentsStep::new(catalog))
        .with_step(UpgradeRuntimeStep::new(client.clone(), status_poll_interval))
        .with_step(AwaitRuntimeStep::new(client, status_poll_interval));

    PipelineRegistry::new()
        .with_pipeline(provision)
        .with_pipeline(deprovision)
        .with_pipeline(update)
}

/// Transient backend errors retry, everything else is permanent
fn backend_outcome(err: &ProvisionerError, poll: Duration) -> StepOutcome {
    if err.is_transient() {
        StepOutcome::retry_because(err.retry_after().unwrap_or(poll), err.to_string())
    } else {
        StepOutcome::fail(err.to_string())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
