// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! eb-engine: the operation pipeline
//!
//! - `Step` / `StepPipeline`: ordered, idempotent units of work per kind
//! - `OperationManager`: the only writer of operation lifecycle state
//! - `Worker` / `WorkerPool`: lease-guarded scheduler loops
//! - `Broker`: request facade that creates and reports on operations

mod broker;
mod error;
mod manager;
mod pipeline;
mod pool;
mod step;
pub mod steps;
mod worker;

#[cfg(any(test, feature = "test-support"))]
mod testing;

pub use broker::{Broker, Deprovisioner, Provisioner, StatusReader, StatusReport, Updater};
pub use error::{BrokerError, ManagerError, WorkerError};
pub use manager::{Committed, Disposition, OperationManager};
pub use pipeline::{PipelineRegistry, StepPipeline};
pub use pool::WorkerPool;
pub use step::Step;
pub use steps::default_registry;
pub use worker::{Executed, Worker, WorkerConfig};

#[cfg(any(test, feature = "test-support"))]
pub use testing::ScriptedStep;
