//! Worker scenarios
//!
//! Retries, permanent failures, timeouts and lease races on a single
//! operation.

use crate::prelude::*;

#[tokio::test]
async fn retries_twice_then_succeeds() {
    let world = World::new();
    let validate = ScriptedStep::new("validate");
    let create = ScriptedStep::new("create").with_outcomes([
        StepOutcome::retry_after(Duration::from_secs(5)),
        StepOutcome::retry_after(Duration::from_secs(5)),
    ]);
    let wait = ScriptedStep::new("wait");
    let registry = PipelineRegistry::new().with_pipeline(pipeline(
        OperationKind::Provision,
        &[&validate, &create, &wait],
    ));
    let worker = world.worker("w-1", registry, worker_config("w"));

    let id = world
        .broker
        .provision(&InstanceId::new("inst-1"), &azure())
        .unwrap();

    worker.run_once().await.unwrap().unwrap();
    assert_eq!(world.state(&id), OperationState::Retrying);
    assert!(worker.run_once().await.unwrap().is_none());

    world.clock.advance(Duration::from_secs(5));
    worker.run_once().await.unwrap().unwrap();
    assert_eq!(world.state(&id), OperationState::Retrying);

    world.clock.advance(Duration::from_secs(5));
    let executed = worker.run_once().await.unwrap().unwrap();
    assert_eq!(executed.state, OperationState::Succeeded);

    let op = world.store.get(&id).unwrap();
    assert_eq!(op.step_index, 3);
    assert!(op.updated_at - op.created_at >= chrono::Duration::seconds(10));
    assert_eq!((validate.calls(), create.calls(), wait.calls()), (1, 3, 1));
}

#[tokio::test]
async fn permanent_error_fails_at_first_step() {
    let world = World::new();
    let validate =
        ScriptedStep::new("validate").with_outcomes([StepOutcome::fail("invalid region")]);
    let create = ScriptedStep::new("create");
    let registry = PipelineRegistry::new()
        .with_pipeline(pipeline(OperationKind::Provision, &[&validate, &create]));
    let worker = world.worker("w-1", registry, worker_config("w"));

    let id = world
        .broker
        .provision(&InstanceId::new("inst-1"), &azure())
        .unwrap();
    worker.run_once().await.unwrap().unwrap();

    let report = world.broker.last_operation(&id).unwrap();
    assert_eq!(report.state, OperationState::Failed);
    assert_eq!(report.failure, Some(FailureKind::Permanent));
    assert_eq!(report.last_error.as_deref(), Some("invalid region"));
    assert_eq!(report.step_index, 0);
    assert_eq!(create.calls(), 0);
}

#[tokio::test]
async fn timeout_while_retrying_fails_operation() {
    let world = World::new();
    let create = ScriptedStep::new("create");
    let wait = ScriptedStep::new("wait").with_outcomes(
        (0..10).map(|_| StepOutcome::retry_after(Duration::from_secs(20))),
    );
    let registry = PipelineRegistry::new()
        .with_pipeline(pipeline(OperationKind::Provision, &[&create, &wait]));
    let config = WorkerConfig {
        operation_timeout: Duration::from_secs(30),
        ..worker_config("w")
    };
    let worker = world.worker("w-1", registry, config);

    let id = world
        .broker
        .provision(&InstanceId::new("inst-1"), &azure())
        .unwrap();
    worker.run_once().await.unwrap().unwrap();
    world.clock.advance(Duration::from_secs(20));
    worker.run_once().await.unwrap().unwrap();
    assert_eq!(world.state(&id), OperationState::Retrying);

    world.clock.advance(Duration::from_secs(20));
    worker.run_once().await.unwrap().unwrap();

    let report = world.broker.last_operation(&id).unwrap();
    assert_eq!(report.state, OperationState::Failed);
    assert_eq!(report.failure, Some(FailureKind::Timeout));
    assert_eq!(report.step_index, 1);
}

#[tokio::test]
async fn racing_workers_run_step_once() {
    let world = World::new();
    let slow = ScriptedStep::new("slow").with_delay(Duration::from_millis(50));
    let registry = || {
        PipelineRegistry::new().with_pipeline(pipeline(OperationKind::Provision, &[&slow]))
    };
    let first = world.worker("w-1", registry(), worker_config("w"));
    let second = world.worker("w-2", registry(), worker_config("w"));

    let id = world
        .broker
        .provision(&InstanceId::new("inst-1"), &azure())
        .unwrap();
    let (a, b) = tokio::join!(first.run_once(), second.run_once());
    let executed: Vec<_> = [a.unwrap(), b.unwrap()].into_iter().flatten().collect();

    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].operation_id, id);
    assert_eq!(slow.calls(), 1);
    assert_eq!(world.state(&id), OperationState::Succeeded);
}

#[tokio::test]
async fn lease_excludes_concurrent_holders() {
    let world = World::new();
    let ttl = Duration::from_secs(60);

    assert!(world.leases.acquire("op-1", &HolderId::new("a"), ttl).unwrap());
    assert!(!world.leases.acquire("op-1", &HolderId::new("b"), ttl).unwrap());

    world.leases.release("op-1", &HolderId::new("a")).unwrap();
    assert!(world.leases.acquire("op-1", &HolderId::new("b"), ttl).unwrap());
}
