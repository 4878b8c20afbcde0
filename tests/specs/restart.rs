//! Restart: everything a worker needs lives in the store, so a fresh
//! process resumes at the persisted step.

use crate::prelude::*;
use eb_storage::FileStore;

#[tokio::test]
async fn reopened_file_store_resumes_at_persisted_step() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let validate = ScriptedStep::new("validate");
    let create = ScriptedStep::new("create")
        .with_outcomes([StepOutcome::retry_after(Duration::from_secs(5))]);
    let wait = ScriptedStep::new("wait");
    let registry = || {
        Arc::new(PipelineRegistry::new().with_pipeline(pipeline(
            OperationKind::Provision,
            &[&validate, &create, &wait],
        )))
    };
    let catalog = Arc::new(PlanCatalog::new(&EnablePlans::default()));

    let id = {
        let store = FileStore::open_with_clock(dir.path(), clock.clone()).unwrap();
        let broker = Broker::new(
            store.clone(),
            clock.clone(),
            SequentialIdGen::default(),
            Arc::clone(&catalog),
        );
        let id = broker.provision(&InstanceId::new("inst-1"), &azure()).unwrap();
        let worker = Worker::new(
            store.clone(),
            store,
            clock.clone(),
            registry(),
            worker_config("before"),
        );
        worker.run_once().await.unwrap().unwrap();
        id
    };

    let store = FileStore::open_with_clock(dir.path(), clock.clone()).unwrap();
    let op = store.get(&id).unwrap();
    assert_eq!(op.state, OperationState::Retrying);
    assert_eq!(op.step_index, 1);

    clock.advance(Duration::from_secs(5));
    let worker = Worker::new(
        store.clone(),
        store.clone(),
        clock.clone(),
        registry(),
        worker_config("after"),
    );
    let executed = worker.run_once().await.unwrap().unwrap();
    assert_eq!(executed.state, OperationState::Succeeded);
    assert_eq!(store.get(&id).unwrap().step_index, 3);
    assert_eq!((validate.calls(), create.calls(), wait.calls()), (1, 2, 1));
}
