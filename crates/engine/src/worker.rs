// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler worker
//!
//! A worker polls the store for due operations, takes the per-operation
//! lease, and drives the operation through its pipeline until it is
//! rescheduled or reaches a terminal state. All state changes go through the
//! `OperationManager`; the worker itself only decides what to ask for.

use crate::error::WorkerError;
use crate::manager::{Committed, Disposition, OperationManager};
use crate::pipeline::PipelineRegistry;
use eb_core::clock::elapsed_between;
use eb_core::{
    BrokerConfig, Clock, FailureKind, HolderId, Operation, OperationId, OperationState,
    StepOutcome,
};
use eb_storage::{LeaseStore, OperationStore, StoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::Instrument;

/// Knobs for one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub holder: HolderId,
    pub lease_ttl: Duration,
    pub operation_timeout: Duration,
    pub step_timeout: Duration,
    pub min_retry: Duration,
    pub max_retry: Duration,
    pub poll_interval: Duration,
}

impl WorkerConfig {
    pub fn from_config(config: &BrokerConfig, holder: HolderId) -> Self {
        Self {
            holder,
            lease_ttl: config.lease_ttl,
            operation_timeout: config.operation_timeout,
            step_timeout: config.step_timeout,
            min_retry: config.min_retry,
            max_retry: config.max_retry,
            poll_interval: config.poll_interval,
        }
    }

    pub fn with_holder(mut self, holder: HolderId) -> Self {
        self.holder = holder;
        self
    }

    /// Clamp an advisory retry delay into `[min_retry, max_retry]`
    pub fn clamp_retry(&self, delay: Duration) -> Duration {
        delay.max(self.min_retry).min(self.max_retry.max(self.min_retry))
    }
}

/// Summary of one worker cycle that touched an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub operation_id: OperationId,
    pub steps_run: usize,
    pub state: OperationState,
}

/// Polls due operations and executes them under a lease
pub struct Worker<S, L, C> {
    store: S,
    leases: L,
    clock: C,
    registry: Arc<PipelineRegistry>,
    manager: OperationManager<S, C>,
    config: WorkerConfig,
}

impl<S, L, C> Worker<S, L, C>
where
    S: OperationStore,
    L: LeaseStore,
    C: Clock,
{
    pub fn new(
        store: S,
        leases: L,
        clock: C,
        registry: Arc<PipelineRegistry>,
        config: WorkerConfig,
    ) -> Self {
        let manager = OperationManager::new(store.clone(), clock.clone());
        Self {
            store,
            leases,
            clock,
            registry,
            manager,
            config,
        }
    }

    pub fn holder(&self) -> &HolderId {
        &self.config.holder
    }

    /// Execute at most one due operation.
    ///
    /// Returns `Ok(None)` when nothing was due or every candidate was held
    /// by someone else, queued behind another operation, or lost to a
    /// concurrent writer. Store and lease outages abort the cycle with an
    /// error and leave every operation untouched.
    pub async fn run_once(&self) -> Result<Option<Executed>, WorkerError> {
        let due = self.store.list_due(self.clock.now())?;
        for candidate in due {
            let key = candidate.id.as_str();
            if !self
                .leases
                .acquire(key, &self.config.holder, self.config.lease_ttl)?
            {
                tracing::debug!(operation_id = %candidate.id, "lease held elsewhere");
                continue;
            }

            let result = self.execute(&candidate.id).await;
            if let Err(e) = self.leases.release(key, &self.config.holder) {
                tracing::warn!(operation_id = %candidate.id, error = %e, "failed to release lease");
            }
            if let Some(executed) = result? {
                return Ok(Some(executed));
            }
        }
        Ok(None)
    }

    /// Poll until `shutdown` flips to true or its sender goes away
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(holder = %self.config.holder, "worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let idle = match self.run_once().await {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => {
                    tracing::warn!(holder = %self.config.holder, error = %e, "worker cycle skipped");
                    true
                }
            };
            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }
        tracing::info!(holder = %self.config.holder, "worker stopped");
    }

    async fn execute(&self, id: &OperationId) -> Result<Option<Executed>, WorkerError> {
        // The listing is only a hint; the copy read under the lease is authoritative
        let op = match self.store.get(id) {
            Ok(op) => op,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !op.is_due(self.clock.now()) {
            return Ok(None);
        }
        if !self.is_queue_head(&op)? {
            tracing::debug!(
                operation_id = %op.id,
                instance_id = %op.instance_id,
                "queued behind an earlier operation"
            );
            return Ok(None);
        }

        let span = tracing::info_span!(
            "operation",
            operation_id = %op.id,
            instance_id = %op.instance_id,
            kind = %op.kind,
        );
        match self.drive(op).instrument(span).await {
            Err(WorkerError::Manager(e)) if e.is_lost_race() => {
                tracing::info!(operation_id = %id, error = %e, "lost write race, keeping stored copy");
                Ok(None)
            }
            other => other,
        }
    }

    /// Only the oldest non-terminal operation of an instance may run
    fn is_queue_head(&self, op: &Operation) -> Result<bool, StoreError> {
        let queue = self.store.list_by_instance(&op.instance_id)?;
        Ok(queue
            .iter()
            .find(|queued| !queued.is_terminal())
            .is_none_or(|head| head.id == op.id))
    }

    async fn drive(&self, mut op: Operation) -> Result<Option<Executed>, WorkerError> {
        if op.state == OperationState::Pending {
            op = self.manager.mark_started(&op)?;
        }

        let mut steps_run = 0;
        loop {
            if self.timed_out(&op) {
                let committed = self.fail_timeout(&op)?;
                return Ok(Some(finished(committed, steps_run)));
            }

            let Some(pipeline) = self.registry.get(op.kind) else {
                let reason = format!("no pipeline for {}", op.kind);
                let committed = self.manager.mark_failed(&op, reason, FailureKind::Permanent)?;
                return Ok(Some(finished(committed, steps_run)));
            };
            let Some(step) = pipeline.next(&op) else {
                let committed = self.manager.mark_succeeded(&op)?;
                return Ok(Some(finished(committed, steps_run)));
            };

            let step_name = step.name().to_string();
            let started = Instant::now();
            let (result, outcome) =
                match tokio::time::timeout(self.config.step_timeout, step.run(op.clone())).await {
                    Ok(returned) => returned,
                    Err(_) => {
                        let reason = format!(
                            "step {} timed out after {}",
                            step_name,
                            humantime::format_duration(self.config.step_timeout)
                        );
                        (op.clone(), StepOutcome::retry_because(self.config.min_retry, reason))
                    }
                };
            steps_run += 1;
            tracing::info!(
                step = %step_name,
                step_index = op.step_index,
                outcome = outcome.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "step returned"
            );

            // A step may outlive the lease; writing after losing it would race the new holder
            if !self.leases.renew(
                op.id.as_str(),
                &self.config.holder,
                self.config.lease_ttl,
            )? {
                tracing::warn!(step = %step_name, "lease lost during step, discarding result");
                return Ok(None);
            }

            op.input = result.input;
            op.runtime_id = result.runtime_id;

            match outcome {
                StepOutcome::Done => {
                    let committed = self
                        .manager
                        .mark_step_done(&op, &step_name, pipeline.len())?;
                    match committed.disposition {
                        Disposition::Advanced => op = committed.op,
                        _ => return Ok(Some(finished(committed, steps_run))),
                    }
                }
                StepOutcome::RetryAfter { after, reason } => {
                    if self.timed_out(&op) {
                        let committed = self.fail_timeout(&op)?;
                        return Ok(Some(finished(committed, steps_run)));
                    }
                    let delay = self.config.clamp_retry(after);
                    let committed = self
                        .manager
                        .mark_retrying(&op, &step_name, delay, reason)?;
                    return Ok(Some(finished(committed, steps_run)));
                }
                StepOutcome::Fail(reason) => {
                    let committed = self
                        .manager
                        .mark_failed(&op, reason, FailureKind::Permanent)?;
                    return Ok(Some(finished(committed, steps_run)));
                }
            }
        }
    }

    fn timed_out(&self, op: &Operation) -> bool {
        op.started_at.is_some_and(|started| {
            elapsed_between(started, self.clock.now()) > self.config.operation_timeout
        })
    }

    fn fail_timeout(&self, op: &Operation) -> Result<Committed, WorkerError> {
        let reason = format!(
            "operation timed out after {}",
            humantime::format_duration(self.config.operation_timeout)
        );
        Ok(self.manager.mark_failed(op, reason, FailureKind::Timeout)?)
    }
}

fn finished(committed: Committed, steps_run: usize) -> Executed {
    Executed {
        operation_id: committed.op.id,
        steps_run,
        state: committed.op.state,
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
