// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testing::ScriptedStep;
use chrono::Utc;
use eb_core::{InstanceId, OperationId, ProvisioningParameters};

fn op_at(index: usize) -> Operation {
    let mut op = Operation::new(
        OperationId::from("op-1"),
        InstanceId::from("inst-1"),
        OperationKind::Provision,
        ProvisioningParameters::default(),
        Utc::now(),
    );
    op.step_index = index;
    op
}

fn three_steps() -> StepPipeline {
    StepPipeline::new(OperationKind::Provision)
        .with_step(ScriptedStep::new("first"))
        .with_step(ScriptedStep::new("second"))
        .with_step(ScriptedStep::new("third"))
}

#[test]
fn next_follows_step_index() {
    let pipeline = three_steps();
    assert_eq!(pipeline.len(), 3);
    assert_eq!(pipeline.next(&op_at(0)).map(|s| s.name()), Some("first"));
    assert_eq!(pipeline.next(&op_at(2)).map(|s| s.name()), Some("third"));
    assert!(pipeline.next(&op_at(3)).is_none());
    assert!(pipeline.next(&op_at(7)).is_none());
}

#[test]
fn step_names_in_order() {
    assert_eq!(three_steps().step_names(), vec!["first", "second", "third"]);
}

#[test]
fn registry_lookup_by_kind() {
    let registry = PipelineRegistry::new()
        .with_pipeline(three_steps())
        .with_pipeline(
            StepPipeline::new(OperationKind::Deprovision).with_step(ScriptedStep::new("remove")),
        );

    assert_eq!(registry.get(OperationKind::Provision).map(|p| p.len()), Some(3));
    assert_eq!(
        registry.get(OperationKind::Deprovision).map(|p| p.len()),
        Some(1)
    );
    assert!(registry.get(OperationKind::Update).is_none());
}

#[test]
fn empty_pipeline_has_no_next() {
    let pipeline = StepPipeline::new(OperationKind::Update);
    assert!(pipeline.is_empty());
    assert!(pipeline.next(&op_at(0)).is_none());
}
