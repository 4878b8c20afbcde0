// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! eb-core: domain types for the environment broker
//!
//! This crate provides:
//! - The durable `Operation` record and its state machine vocabulary
//! - The `StepOutcome` sum type returned by pipeline steps
//! - A pure lease state machine for per-operation mutual exclusion
//! - The immutable plan catalog and broker configuration
//! - Audit events appended to the operation log

pub mod clock;
pub mod config;
pub mod event;
pub mod id;
pub mod lease;
pub mod operation;
pub mod outcome;
pub mod plan;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BrokerConfig, ConfigError, SimulatorConfig};
pub use event::{EventKind, OperationEvent};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use lease::{HolderId, Lease, LeaseDecision, LeaseInput, LeaseState};
pub use operation::{
    FailureKind, InputCreator, InstanceId, Operation, OperationId, OperationKind, OperationState,
    ProvisioningParameters,
};
pub use outcome::StepOutcome;
pub use plan::{EnablePlans, Plan, PlanCatalog, PlanError, ProvisionRequest};
