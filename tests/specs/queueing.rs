//! Per-instance queueing: one active operation per instance, later ones
//! wait until it is terminal or superseded.

use crate::prelude::*;

fn registry(provision: &ScriptedStep, deprovision: &ScriptedStep) -> PipelineRegistry {
    PipelineRegistry::new()
        .with_pipeline(pipeline(OperationKind::Provision, &[provision]))
        .with_pipeline(pipeline(OperationKind::Deprovision, &[deprovision]))
}

#[tokio::test]
async fn deprovision_waits_for_active_provision() {
    let world = World::new();
    let provision = ScriptedStep::new("create")
        .with_outcomes([StepOutcome::retry_after(Duration::from_secs(5))]);
    let deprovision = ScriptedStep::new("remove");
    let worker = world.worker("w-1", registry(&provision, &deprovision), worker_config("w"));
    let instance = InstanceId::new("inst-1");

    let first = world.broker.provision(&instance, &azure()).unwrap();
    worker.run_once().await.unwrap().unwrap();
    assert_eq!(world.state(&first), OperationState::Retrying);

    let second = world.broker.deprovision(&instance).unwrap();
    assert!(worker.run_once().await.unwrap().is_none());
    assert_eq!(world.state(&second), OperationState::Pending);
    assert_eq!(deprovision.calls(), 0);

    world.clock.advance(Duration::from_secs(5));
    let executed = worker.run_once().await.unwrap().unwrap();
    assert_eq!(executed.operation_id, first);
    assert_eq!(world.state(&second), OperationState::Pending);

    let executed = worker.run_once().await.unwrap().unwrap();
    assert_eq!(executed.operation_id, second);
    assert_eq!(world.state(&second), OperationState::Succeeded);
}

#[tokio::test]
async fn superseding_active_operation_unblocks_queue() {
    let world = World::new();
    let provision = ScriptedStep::new("create")
        .with_outcomes([StepOutcome::retry_after(Duration::from_secs(600))]);
    let deprovision = ScriptedStep::new("remove");
    let worker = world.worker("w-1", registry(&provision, &deprovision), worker_config("w"));
    let instance = InstanceId::new("inst-1");

    let first = world.broker.provision(&instance, &azure()).unwrap();
    worker.run_once().await.unwrap().unwrap();
    let second = world.broker.deprovision(&instance).unwrap();

    let report = world.broker.supersede(&first, "replaced").unwrap();
    assert_eq!(report.state, OperationState::Failed);
    assert_eq!(report.failure, Some(FailureKind::Superseded));

    let executed = worker.run_once().await.unwrap().unwrap();
    assert_eq!(executed.operation_id, second);
    assert_eq!(world.state(&second), OperationState::Succeeded);
    assert_eq!(provision.calls(), 1);
}

#[tokio::test]
async fn other_instances_are_not_blocked() {
    let world = World::new();
    let provision = ScriptedStep::new("create")
        .with_outcomes([StepOutcome::retry_after(Duration::from_secs(600))]);
    let deprovision = ScriptedStep::new("remove");
    let worker = world.worker("w-1", registry(&provision, &deprovision), worker_config("w"));

    let stuck = world
        .broker
        .provision(&InstanceId::new("inst-1"), &azure())
        .unwrap();
    worker.run_once().await.unwrap().unwrap();

    let other = world
        .broker
        .provision(&InstanceId::new("inst-2"), &azure())
        .unwrap();
    let executed = worker.run_once().await.unwrap().unwrap();
    assert_eq!(executed.operation_id, other);
    assert_eq!(world.state(&other), OperationState::Succeeded);
    assert_eq!(world.state(&stuck), OperationState::Retrying);
}
