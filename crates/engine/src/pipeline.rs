// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step pipelines
//!
//! A pipeline is the fixed order of steps for one operation kind. Data
//! dependencies between steps are expressed purely by that order.

use crate::step::Step;
use eb_core::{Operation, OperationKind};
use std::collections::HashMap;

/// Ordered steps for one operation kind
pub struct StepPipeline {
    kind: OperationKind,
    steps: Vec<Box<dyn Step>>,
}

impl StepPipeline {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step at the operation's index, or `None` once past the last one
    pub fn next(&self, op: &Operation) -> Option<&dyn Step> {
        self.steps.get(op.step_index).map(|step| step.as_ref())
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }
}

/// Pipelines by operation kind, immutable once built
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: HashMap<OperationKind, StepPipeline>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pipeline, replacing any earlier one for the same kind
    pub fn with_pipeline(mut self, pipeline: StepPipeline) -> Self {
        self.pipelines.insert(pipeline.kind(), pipeline);
        self
    }

    pub fn get(&self, kind: OperationKind) -> Option<&StepPipeline> {
        self.pipelines.get(&kind)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
