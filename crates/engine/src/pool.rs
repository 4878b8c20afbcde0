// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool: N independently polling workers sharing one shutdown signal

use crate::pipeline::PipelineRegistry;
use crate::worker::{Worker, WorkerConfig};
use eb_core::{Clock, HolderId};
use eb_storage::{LeaseStore, OperationStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct WorkerPool {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers. Each gets its own holder ID derived from the
    /// template's holder, e.g. `host-123/2`.
    pub fn start<S, L, C>(
        count: usize,
        store: S,
        leases: L,
        clock: C,
        registry: Arc<PipelineRegistry>,
        template: WorkerConfig,
    ) -> Self
    where
        S: OperationStore,
        L: LeaseStore,
        C: Clock,
    {
        let (shutdown, rx) = watch::channel(false);
        let handles = (0..count)
            .map(|i| {
                let holder = HolderId::new(format!("{}/{}", template.holder, i));
                let worker = Worker::new(
                    store.clone(),
                    leases.clone(),
                    clock.clone(),
                    Arc::clone(&registry),
                    template.clone().with_holder(holder),
                );
                tokio::spawn(worker.run(rx.clone()))
            })
            .collect();
        tracing::info!(workers = count, "worker pool started");
        Self { shutdown, handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal every worker and wait for them to finish their current cycle
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "worker task failed");
            }
        }
        tracing::info!("worker pool stopped");
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
