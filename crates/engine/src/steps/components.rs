// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::step::Step;
use async_trait::async_trait;
use eb_core::{Operation, PlanCatalog, StepOutcome};
use std::sync::Arc;

/// Enable one fixed component. Depends on the input having been initialised.
pub struct EnableComponentStep {
    component: String,
    name: String,
}

impl EnableComponentStep {
    pub fn new(component: impl Into<String>) -> Self {
        let component = component.into();
        let name = format!("enable_{}", component);
        Self { component, name }
    }
}

#[async_trait]
impl Step for EnableComponentStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, mut op: Operation) -> (Operation, StepOutcome) {
        if !op.input.is_initialized() {
            let reason = format!("cannot enable {} before the input is initialised", self.component);
            return (op, StepOutcome::Fail(reason));
        }
        tracing::info!(
            operation_id = %op.id,
            plan_id = %op.parameters.plan_id,
            component = %self.component,
            "enabling component"
        );
        op.input.enable_component(self.component.clone());
        (op, StepOutcome::Done)
    }
}

/// Enable the requested add-ons the plan allows
pub struct OptionalComponentsStep {
    catalog: Arc<PlanCatalog>,
}

impl OptionalComponentsStep {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Step for OptionalComponentsStep {
    fn name(&self) -> &str {
        "optional_components"
    }

    async fn run(&self, mut op: Operation) -> (Operation, StepOutcome) {
        let Some(plan) = self.catalog.by_id(&op.parameters.plan_id) else {
            let reason = format!("unknown plan {}", op.parameters.plan_id);
            return (op, StepOutcome::Fail(reason));
        };
        for component in op.parameters.components.clone() {
            if plan.allows_component(&component) {
                op.input.enable_component(component);
            } else {
                tracing::warn!(
                    operation_id = %op.id,
                    plan = plan.name,
                    component = %component,
                    "component not offered by plan, skipping"
                );
            }
        }
        (op, StepOutcome::Done)
    }
}
