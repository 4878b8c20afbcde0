// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step contract

use async_trait::async_trait;
use eb_core::{Operation, StepOutcome};

/// A named, idempotent unit of work in a pipeline.
///
/// A step receives a snapshot of the operation and returns it together with
/// an outcome. Only `input` and `runtime_id` of the returned operation are
/// kept; lifecycle fields are owned by the operation manager. A step may run
/// again after a crash, so it must check remote state before acting.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, op: Operation) -> (Operation, StepOutcome);
}
