//! Shared fixtures for broker specs

pub use eb_core::{
    Clock, EnablePlans, FailureKind, FakeClock, HolderId, InstanceId, OperationId, OperationKind,
    OperationState, PlanCatalog, ProvisionRequest, SequentialIdGen, StepOutcome,
};
pub use eb_engine::{
    Broker, Deprovisioner, PipelineRegistry, Provisioner, ScriptedStep, StatusReader,
    StepPipeline, Worker, WorkerConfig,
};
pub use eb_storage::{LeaseStore, MemoryLeaseStore, MemoryStore, OperationStore};
pub use std::sync::Arc;
pub use std::time::Duration;

pub fn worker_config(holder: &str) -> WorkerConfig {
    WorkerConfig {
        holder: HolderId::new(holder),
        lease_ttl: Duration::from_secs(60),
        operation_timeout: Duration::from_secs(3600),
        step_timeout: Duration::from_secs(5),
        min_retry: Duration::from_secs(1),
        max_retry: Duration::from_secs(600),
        poll_interval: Duration::from_millis(10),
    }
}

pub fn pipeline(kind: OperationKind, steps: &[&ScriptedStep]) -> StepPipeline {
    steps
        .iter()
        .fold(StepPipeline::new(kind), |p, step| p.with_step((*step).clone()))
}

pub fn azure() -> ProvisionRequest {
    ProvisionRequest {
        plan: "azure".to_string(),
        ..ProvisionRequest::default()
    }
}

/// Broker plus worker wiring over one in-memory store
pub struct World {
    pub store: MemoryStore,
    pub leases: MemoryLeaseStore<FakeClock>,
    pub clock: FakeClock,
    pub broker: Broker<MemoryStore, FakeClock, SequentialIdGen>,
}

impl World {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        let store = MemoryStore::new();
        let catalog = PlanCatalog::new(&EnablePlans::parse("azure,gcp").unwrap());
        Self {
            broker: Broker::new(
                store.clone(),
                clock.clone(),
                SequentialIdGen::default(),
                Arc::new(catalog),
            ),
            leases: MemoryLeaseStore::with_clock(clock.clone()),
            store,
            clock,
        }
    }

    pub fn worker(
        &self,
        holder: &str,
        registry: PipelineRegistry,
        config: WorkerConfig,
    ) -> Worker<MemoryStore, MemoryLeaseStore<FakeClock>, FakeClock> {
        Worker::new(
            self.store.clone(),
            self.leases.clone(),
            self.clock.clone(),
            Arc::new(registry),
            config.with_holder(HolderId::new(holder)),
        )
    }

    pub fn state(&self, id: &OperationId) -> OperationState {
        self.broker.last_operation(id).unwrap().state
    }
}
