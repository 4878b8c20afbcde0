// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use eb_adapters::{SimulatedProvisioner, TracedProvisionerClient};
use eb_core::{BrokerConfig, HolderId, SystemClock};
use eb_engine::{default_registry, WorkerConfig, WorkerPool};
use eb_storage::{FileStore, OperationStore, StoreError};
use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

/// Daemon state during operation
pub struct Daemon {
    pub config: BrokerConfig,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pool: WorkerPool,
    pub start_time: Instant,
}

impl Daemon {
    pub fn workers(&self) -> usize {
        self.pool.len()
    }

    /// Stop the workers after their current cycle, then drop the lock
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");
        self.pool.shutdown().await;

        let lock_path = self.config.lock_path();
        if lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &BrokerConfig) -> Result<Daemon, LifecycleError> {
    match startup_inner(config).await {
        Ok(daemon) => Ok(daemon),
        // The lock (and its PID file) belong to the daemon that is running
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

async fn startup_inner(config: &BrokerConfig) -> Result<Daemon, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons sharing workers
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(config.lock_path())?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Open the store and report work left over from a previous run
    let store = FileStore::open(config.operations_dir())?;
    reconcile_state(&store)?;

    // 4. Provisioning backend (wrapped with tracing for observability)
    let provisioner = TracedProvisionerClient::new(
        SimulatedProvisioner::new(config.simulator.clone())
            .with_state_file(config.simulator_state_path()),
    );

    // 5. Pipelines and workers
    let registry = default_registry(
        provisioner,
        Arc::new(config.catalog()),
        config.status_poll_interval,
    );
    let template = WorkerConfig::from_config(
        config,
        HolderId::new(format!("ebd-{}", std::process::id())),
    );
    let pool = WorkerPool::start(
        config.workers,
        store.clone(),
        store,
        SystemClock,
        Arc::new(registry),
        template,
    );

    info!(
        state_dir = %config.state_dir.display(),
        workers = config.workers,
        plans = %config.enable_plans,
        "Daemon started"
    );

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        pool,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &BrokerConfig) {
    let lock_path = config.lock_path();
    if lock_path.exists() {
        let _ = std::fs::remove_file(&lock_path);
    }
}

/// Log operations that were in flight when the previous daemon stopped.
/// Nothing needs repairing: their leases expire and workers resume them at
/// their persisted step.
fn reconcile_state<S: OperationStore>(store: &S) -> Result<usize, LifecycleError> {
    let in_flight = store.list_due(DateTime::<Utc>::MAX_UTC)?;
    if !in_flight.is_empty() {
        warn!(
            "Found {} unfinished operations from a previous run, resuming",
            in_flight.len()
        );
        for op in &in_flight {
            info!(
                operation_id = %op.id,
                instance_id = %op.instance_id,
                kind = %op.kind,
                state = %op.state,
                step_index = op.step_index,
                "  - resuming"
            );
        }
    }
    Ok(in_flight.len())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
