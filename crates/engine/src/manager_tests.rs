// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use eb_core::{FakeClock, InstanceId, OperationId, OperationKind, ProvisioningParameters};
use eb_storage::MemoryStore;

fn setup() -> (MemoryStore, FakeClock, OperationManager<MemoryStore, FakeClock>, Operation) {
    let store = MemoryStore::new();
    let clock = FakeClock::new();
    let op = Operation::new(
        OperationId::from("op-1"),
        InstanceId::from("inst-1"),
        OperationKind::Provision,
        ProvisioningParameters::default(),
        clock.now(),
    );
    store.insert(&op).unwrap();
    let manager = OperationManager::new(store.clone(), clock.clone());
    (store, clock, manager, op)
}

#[test]
fn started_stamps_time_once() {
    let (_store, clock, manager, op) = setup();
    clock.advance(Duration::from_secs(3));
    let started = manager.mark_started(&op).unwrap();

    assert_eq!(started.state, OperationState::InProgress);
    assert_eq!(started.started_at, Some(clock.now()));
    assert_eq!(started.version, 1);
}

#[test]
fn step_done_advances_and_resets_attempts() {
    let (store, _clock, manager, op) = setup();
    let mut started = manager.mark_started(&op).unwrap();
    started.attempts = 2;
    started.last_error = Some("not ready".to_string());
    started.runtime_id = Some("rt-1".to_string());

    let committed = manager.mark_step_done(&started, "create", 3).unwrap();
    assert_eq!(committed.disposition, Disposition::Advanced);
    assert_eq!(committed.op.step_index, 1);
    assert_eq!(committed.op.attempts, 0);
    assert_eq!(committed.op.last_error, None);

    let stored = store.get(&op.id).unwrap();
    assert_eq!(stored.runtime_id.as_deref(), Some("rt-1"));
    assert_eq!(stored, committed.op);
}

#[test]
fn last_step_done_finishes() {
    let (store, _clock, manager, op) = setup();
    let mut current = manager.mark_started(&op).unwrap();
    for (i, name) in ["a", "b"].iter().enumerate() {
        let committed = manager.mark_step_done(&current, name, 2).unwrap();
        if i == 1 {
            assert_eq!(committed.disposition, Disposition::Finished);
            assert_eq!(committed.op.state, OperationState::Succeeded);
        }
        current = committed.op;
    }
    assert_eq!(current.step_index, 2);

    let kinds: Vec<_> = store
        .events(&op.id)
        .unwrap()
        .into_iter()
        .map(|e| e.kind.name())
        .collect();
    assert_eq!(
        kinds,
        vec!["started", "step_completed", "step_completed", "succeeded"]
    );
}

#[test]
fn retrying_schedules_without_advancing() {
    let (_store, clock, manager, op) = setup();
    let started = manager.mark_started(&op).unwrap();

    let committed = manager
        .mark_retrying(
            &started,
            "await",
            Duration::from_secs(5),
            Some("runtime provisioning".to_string()),
        )
        .unwrap();

    assert_eq!(
        committed.disposition,
        Disposition::Rescheduled(Duration::from_secs(5))
    );
    assert_eq!(committed.op.state, OperationState::Retrying);
    assert_eq!(committed.op.step_index, 0);
    assert_eq!(committed.op.attempts, 1);
    assert_eq!(committed.op.last_error.as_deref(), Some("runtime provisioning"));
    assert_eq!(
        committed.op.next_attempt_at,
        clock.now() + chrono::Duration::seconds(5)
    );
    assert!(!committed.op.is_due(clock.now()));
}

#[test]
fn failed_records_reason_and_kind() {
    let (store, _clock, manager, op) = setup();
    let started = manager.mark_started(&op).unwrap();
    let committed = manager
        .mark_failed(&started, "invalid region", FailureKind::Permanent)
        .unwrap();

    assert_eq!(committed.disposition, Disposition::Finished);
    let stored = store.get(&op.id).unwrap();
    assert_eq!(stored.state, OperationState::Failed);
    assert_eq!(stored.last_error.as_deref(), Some("invalid region"));
    assert_eq!(stored.failure, Some(FailureKind::Permanent));
}

#[test]
fn pending_operation_can_be_superseded() {
    let (store, _clock, manager, op) = setup();
    manager.supersede(&op, "replaced by op-2").unwrap();
    let stored = store.get(&op.id).unwrap();
    assert_eq!(stored.failure, Some(FailureKind::Superseded));
}

#[test]
fn stale_snapshot_is_a_conflict() {
    let (store, _clock, manager, op) = setup();
    let started = manager.mark_started(&op).unwrap();

    // `op` is the pre-start snapshot
    let err = manager.mark_step_done(&op, "first", 3).unwrap_err();
    assert!(matches!(err, ManagerError::Conflict(_)));
    assert!(err.is_lost_race());
    assert_eq!(store.get(&op.id).unwrap(), started);
}

#[test]
fn terminal_operation_refuses_writes() {
    let (_store, _clock, manager, op) = setup();
    let started = manager.mark_started(&op).unwrap();
    let done = manager.mark_succeeded(&started).unwrap().op;

    let err = manager
        .mark_failed(&done, "late", FailureKind::Permanent)
        .unwrap_err();
    assert!(matches!(err, ManagerError::Terminal(_)));
}

#[test]
fn store_outage_is_not_a_race() {
    let (store, _clock, manager, op) = setup();
    store.set_unavailable(true);
    let err = manager.mark_started(&op).unwrap_err();
    assert!(matches!(err, ManagerError::Store(_)));
    assert!(!err.is_lost_race());
}
