// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::step::Step;
use async_trait::async_trait;
use eb_core::{Operation, PlanCatalog, StepOutcome};
use std::sync::Arc;

/// Reject parameters the catalog cannot serve
pub struct ValidateParametersStep {
    catalog: Arc<PlanCatalog>,
}

impl ValidateParametersStep {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }

    fn check(&self, op: &Operation) -> Result<(), String> {
        let params = &op.parameters;
        let plan = self
            .catalog
            .by_id(&params.plan_id)
            .ok_or_else(|| "unknown plan".to_string())?;
        if let Some(region) = &params.region {
            if !plan.offers_region(region) {
                return Err("invalid region".to_string());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Step for ValidateParametersStep {
    fn name(&self) -> &str {
        "validate_parameters"
    }

    async fn run(&self, op: Operation) -> (Operation, StepOutcome) {
        match self.check(&op) {
            Ok(()) => (op, StepOutcome::Done),
            Err(reason) => (op, StepOutcome::Fail(reason)),
        }
    }
}
