// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_runtime_lifecycle() {
    let fake = FakeProvisionerClient::new();
    let instance = InstanceId::from("inst-1");

    assert!(fake.find_runtime(&instance).await.unwrap().is_none());
    let id = fake
        .create_runtime(&instance, &RuntimeInput::default())
        .await
        .unwrap();
    assert_eq!(id, "rt-1");
    assert_eq!(fake.runtime_status(&id).await.unwrap(), RuntimeStatus::Ready);
    assert_eq!(fake.find_runtime(&instance).await.unwrap().unwrap().id, id);

    fake.deprovision_runtime(&id).await.unwrap();
    assert!(matches!(
        fake.runtime_status(&id).await,
        Err(ProvisionerError::NotFound(_))
    ));
    assert_eq!(fake.calls().len(), 6);
    assert_eq!(fake.create_count(), 1);
}

#[tokio::test]
async fn fake_scripted_statuses_then_stored() {
    let fake = FakeProvisionerClient::new();
    fake.set_initial_status(RuntimeStatus::Provisioning);
    let id = fake
        .create_runtime(&InstanceId::from("inst-1"), &RuntimeInput::default())
        .await
        .unwrap();
    fake.script_status(&id, vec![RuntimeStatus::Provisioning, RuntimeStatus::Ready]);

    assert_eq!(
        fake.runtime_status(&id).await.unwrap(),
        RuntimeStatus::Provisioning
    );
    assert_eq!(fake.runtime_status(&id).await.unwrap(), RuntimeStatus::Ready);
    // Script exhausted: the last scripted status sticks
    assert_eq!(fake.runtime_status(&id).await.unwrap(), RuntimeStatus::Ready);
}

#[tokio::test]
async fn fake_injected_failure_hits_next_call_only() {
    let fake = FakeProvisionerClient::new();
    fake.fail_next(ProvisionerError::Unavailable("maintenance".to_string()));

    let instance = InstanceId::from("inst-1");
    let err = fake.find_runtime(&instance).await.unwrap_err();
    assert!(err.is_transient());
    assert!(fake.find_runtime(&instance).await.is_ok());
    assert_eq!(
        fake.calls(),
        vec![
            ProvisionerCall::FindRuntime {
                instance_id: instance.clone()
            },
            ProvisionerCall::FindRuntime {
                instance_id: instance
            },
        ]
    );
}

#[tokio::test]
async fn fake_upgrade_unknown_runtime() {
    let fake = FakeProvisionerClient::new();
    let result = fake
        .upgrade_runtime("rt-missing", &RuntimeInput::default())
        .await;
    assert!(matches!(result, Err(ProvisionerError::NotFound(_))));
}
