// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation manager: the only writer of operation lifecycle state
//!
//! Every method takes the caller's snapshot, derives the next record and
//! commits it with the store's version check. A stale snapshot fails with
//! `ManagerError::Conflict` and nothing is written. After a successful commit
//! the matching audit event is appended.

use crate::error::ManagerError;
use eb_core::clock::to_chrono;
use eb_core::{Clock, EventKind, FailureKind, Operation, OperationEvent, OperationState};
use eb_storage::OperationStore;
use std::time::Duration;

/// What a committed write means for the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Moved to the next step; run it right away
    Advanced,
    /// Same step again after the delay
    Rescheduled(Duration),
    /// Terminal state reached
    Finished,
}

/// A committed write
#[derive(Debug, Clone)]
pub struct Committed {
    pub op: Operation,
    pub disposition: Disposition,
}

/// Sole writer of operation state
#[derive(Clone)]
pub struct OperationManager<S, C> {
    store: S,
    clock: C,
}

impl<S: OperationStore, C: Clock> OperationManager<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// `Pending -> InProgress`, stamping `started_at`
    pub fn mark_started(&self, op: &Operation) -> Result<Operation, ManagerError> {
        let now = self.clock.now();
        let mut next = op.clone();
        next.state = OperationState::InProgress;
        next.started_at = Some(op.started_at.unwrap_or(now));
        next.updated_at = now;
        let committed = self.commit(next, EventKind::Started)?;
        tracing::info!(
            operation_id = %committed.id,
            instance_id = %committed.instance_id,
            kind = %committed.kind,
            "operation started"
        );
        Ok(committed)
    }

    /// Persist the step's mutations and advance the index. Reaching the end
    /// of the pipeline finishes the operation in the same write.
    pub fn mark_step_done(
        &self,
        op: &Operation,
        step: &str,
        pipeline_len: usize,
    ) -> Result<Committed, ManagerError> {
        let now = self.clock.now();
        let mut next = op.clone();
        next.step_index = op.step_index + 1;
        next.attempts = 0;
        next.last_error = None;
        next.updated_at = now;
        next.next_attempt_at = now;
        let finished = next.step_index >= pipeline_len;
        next.state = if finished {
            OperationState::Succeeded
        } else {
            OperationState::InProgress
        };

        let committed = self.commit(
            next,
            EventKind::StepCompleted {
                step: step.to_string(),
                index: op.step_index,
            },
        )?;
        tracing::info!(
            operation_id = %committed.id,
            step,
            step_index = committed.step_index,
            "step completed"
        );

        if finished {
            self.record(&committed, EventKind::Succeeded);
            tracing::info!(operation_id = %committed.id, "operation succeeded");
            return Ok(Committed {
                op: committed,
                disposition: Disposition::Finished,
            });
        }
        Ok(Committed {
            op: committed,
            disposition: Disposition::Advanced,
        })
    }

    /// Schedule the same step again after `after`; the index stays put
    pub fn mark_retrying(
        &self,
        op: &Operation,
        step: &str,
        after: Duration,
        reason: Option<String>,
    ) -> Result<Committed, ManagerError> {
        let now = self.clock.now();
        let mut next = op.clone();
        next.state = OperationState::Retrying;
        next.attempts = op.attempts.saturating_add(1);
        if reason.is_some() {
            next.last_error = reason.clone();
        }
        next.updated_at = now;
        next.next_attempt_at = now + to_chrono(after);

        let committed = self.commit(
            next,
            EventKind::Retrying {
                step: step.to_string(),
                after,
                reason,
            },
        )?;
        tracing::info!(
            operation_id = %committed.id,
            step,
            attempts = committed.attempts,
            after = %humantime::format_duration(after),
            "step rescheduled"
        );
        Ok(Committed {
            op: committed,
            disposition: Disposition::Rescheduled(after),
        })
    }

    pub fn mark_failed(
        &self,
        op: &Operation,
        reason: impl Into<String>,
        failure: FailureKind,
    ) -> Result<Committed, ManagerError> {
        let reason = reason.into();
        let now = self.clock.now();
        let mut next = op.clone();
        next.state = OperationState::Failed;
        next.last_error = Some(reason.clone());
        next.failure = Some(failure);
        next.updated_at = now;

        let committed = self.commit(
            next,
            EventKind::Failed {
                reason: reason.clone(),
                failure,
            },
        )?;
        tracing::warn!(
            operation_id = %committed.id,
            step_index = committed.step_index,
            %failure,
            reason = %reason,
            "operation failed"
        );
        Ok(Committed {
            op: committed,
            disposition: Disposition::Finished,
        })
    }

    /// Finalise an operation whose pipeline has no step left
    pub fn mark_succeeded(&self, op: &Operation) -> Result<Committed, ManagerError> {
        let mut next = op.clone();
        next.state = OperationState::Succeeded;
        next.updated_at = self.clock.now();
        let committed = self.commit(next, EventKind::Succeeded)?;
        tracing::info!(operation_id = %committed.id, "operation succeeded");
        Ok(Committed {
            op: committed,
            disposition: Disposition::Finished,
        })
    }

    /// Abandon a non-terminal operation in favour of a newer one
    pub fn supersede(&self, op: &Operation, reason: &str) -> Result<Committed, ManagerError> {
        self.mark_failed(op, reason, FailureKind::Superseded)
    }

    fn commit(&self, next: Operation, event: EventKind) -> Result<Operation, ManagerError> {
        let committed = self.store.update(&next)?;
        self.record(&committed, event);
        Ok(committed)
    }

    /// The audit log trails the durable record; losing an entry must not
    /// undo a committed transition.
    fn record(&self, op: &Operation, kind: EventKind) {
        let event = OperationEvent::new(op.id.clone(), self.clock.now(), op.version, kind);
        if let Err(e) = self.store.append_event(&event) {
            tracing::warn!(operation_id = %op.id, error = %e, "failed to append audit event");
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
