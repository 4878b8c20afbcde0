// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use eb_core::FakeClock;
use std::time::Duration;

fn config() -> SimulatorConfig {
    SimulatorConfig {
        ready_after: Duration::from_secs(60),
        removed_after: Duration::from_secs(30),
    }
}

fn input(name: &str) -> RuntimeInput {
    RuntimeInput {
        name: name.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn runtime_becomes_ready_after_delay() {
    let clock = FakeClock::new();
    let sim = SimulatedProvisioner::with_clock(config(), clock.clone());
    let instance = InstanceId::from("inst-1");

    let id = sim.create_runtime(&instance, &input("shop")).await.unwrap();
    assert_eq!(
        sim.runtime_status(&id).await.unwrap(),
        RuntimeStatus::Provisioning
    );

    clock.advance(Duration::from_secs(60));
    assert_eq!(sim.runtime_status(&id).await.unwrap(), RuntimeStatus::Ready);

    let found = sim.find_runtime(&instance).await.unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.status, RuntimeStatus::Ready);
}

#[tokio::test]
async fn replayed_create_returns_same_runtime() {
    let clock = FakeClock::new();
    let sim = SimulatedProvisioner::with_clock(config(), clock.clone());
    let instance = InstanceId::from("inst-1");

    let first = sim.create_runtime(&instance, &input("shop")).await.unwrap();
    clock.advance(Duration::from_secs(30));
    let second = sim.create_runtime(&instance, &input("shop")).await.unwrap();
    assert_eq!(first, second);

    // The replay does not restart the readiness timer
    clock.advance(Duration::from_secs(30));
    assert_eq!(sim.runtime_status(&first).await.unwrap(), RuntimeStatus::Ready);
}

#[tokio::test]
async fn create_without_name_is_rejected() {
    let sim = SimulatedProvisioner::with_clock(config(), FakeClock::new());
    let err = sim
        .create_runtime(&InstanceId::from("inst-1"), &RuntimeInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionerError::Rejected(_)));
}

#[tokio::test]
async fn deprovisioned_runtime_disappears() {
    let clock = FakeClock::new();
    let sim = SimulatedProvisioner::with_clock(config(), clock.clone());
    let instance = InstanceId::from("inst-1");
    let id = sim.create_runtime(&instance, &input("shop")).await.unwrap();

    sim.deprovision_runtime(&id).await.unwrap();
    sim.deprovision_runtime(&id).await.unwrap();
    assert_eq!(
        sim.runtime_status(&id).await.unwrap(),
        RuntimeStatus::Deprovisioning
    );

    clock.advance(Duration::from_secs(30));
    assert!(matches!(
        sim.runtime_status(&id).await,
        Err(ProvisionerError::NotFound(_))
    ));
    assert!(sim.find_runtime(&instance).await.unwrap().is_none());
}

#[tokio::test]
async fn upgrade_only_when_ready() {
    let clock = FakeClock::new();
    let sim = SimulatedProvisioner::with_clock(config(), clock.clone());
    let id = sim
        .create_runtime(&InstanceId::from("inst-1"), &input("shop"))
        .await
        .unwrap();

    let busy = sim.upgrade_runtime(&id, &input("shop-v2")).await.unwrap_err();
    assert!(busy.is_transient());

    clock.advance(Duration::from_secs(60));
    sim.upgrade_runtime(&id, &input("shop-v2")).await.unwrap();
    assert_eq!(
        sim.runtime_status(&id).await.unwrap(),
        RuntimeStatus::Upgrading
    );

    clock.advance(Duration::from_secs(60));
    assert_eq!(sim.runtime_status(&id).await.unwrap(), RuntimeStatus::Ready);

    // Same input again is a no-op
    sim.upgrade_runtime(&id, &input("shop-v2")).await.unwrap();
    assert_eq!(sim.runtime_status(&id).await.unwrap(), RuntimeStatus::Ready);
}

#[tokio::test]
async fn state_file_is_shared_between_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulator.json");
    let clock = FakeClock::new();

    let a = SimulatedProvisioner::with_clock(config(), clock.clone()).with_state_file(&path);
    let b = SimulatedProvisioner::with_clock(config(), clock.clone()).with_state_file(&path);

    let id = a
        .create_runtime(&InstanceId::from("inst-1"), &input("shop"))
        .await
        .unwrap();
    let found = b
        .find_runtime(&InstanceId::from("inst-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, id);
}
