// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::step::Step;
use async_trait::async_trait;
use eb_core::{Operation, PlanCatalog, StepOutcome};
use std::sync::Arc;

/// Fill the runtime input from the operation's parameters and plan defaults
pub struct InitInputStep {
    catalog: Arc<PlanCatalog>,
}

impl InitInputStep {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Step for InitInputStep {
    fn name(&self) -> &str {
        "init_input"
    }

    async fn run(&self, mut op: Operation) -> (Operation, StepOutcome) {
        if op.input.is_initialized() {
            return (op, StepOutcome::Done);
        }
        let Some(plan) = self.catalog.by_id(&op.parameters.plan_id) else {
            let reason = format!("unknown plan {}", op.parameters.plan_id);
            return (op, StepOutcome::Fail(reason));
        };

        let params = op.parameters.clone();
        let input = &mut op.input;
        input.runtime_name = Some(params.name.unwrap_or_else(|| op.instance_id.to_string()));
        input.region = Some(params.region.unwrap_or_else(|| plan.default_region.to_string()));
        input.machine_type = Some(
            params
                .machine_type
                .unwrap_or_else(|| plan.default_machine_type.to_string()),
        );
        input
            .labels
            .insert("instance_id".to_string(), op.instance_id.to_string());
        input
            .labels
            .insert("plan".to_string(), plan.name.to_string());

        (op, StepOutcome::Done)
    }
}
