// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result of running one pipeline step

use std::time::Duration;

/// What a step reports back to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step finished; advance to the next one
    Done,
    /// Transient condition; run the same step again after `after`.
    /// `reason` becomes the operation's `last_error` while it waits.
    RetryAfter {
        after: Duration,
        reason: Option<String>,
    },
    /// Unrecoverable; the operation fails with this reason
    Fail(String),
}

impl StepOutcome {
    pub fn retry_after(delay: Duration) -> Self {
        StepOutcome::RetryAfter {
            after: delay,
            reason: None,
        }
    }

    /// Retry with a cause callers see while the operation waits
    pub fn retry_because(delay: Duration, reason: impl Into<String>) -> Self {
        StepOutcome::RetryAfter {
            after: delay,
            reason: Some(reason.into()),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        StepOutcome::Fail(reason.into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            StepOutcome::Done => "done",
            StepOutcome::RetryAfter { .. } => "retry",
            StepOutcome::Fail(_) => "fail",
        }
    }
}
