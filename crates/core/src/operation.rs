// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation record
//!
//! An operation is the durable unit of work: one provision, deprovision or
//! update request for an environment instance, driven through a pipeline of
//! steps. Only the operation manager mutates the lifecycle fields; steps
//! contribute `input` and `runtime_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier for an operation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OperationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the environment instance an operation targets
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The workflow an operation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Provision,
    Deprovision,
    Update,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Provision => "provision",
            OperationKind::Deprovision => "deprovision",
            OperationKind::Update => "update",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle state of an operation
///
/// `Pending -> InProgress -> {Retrying -> InProgress}* -> {Succeeded | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Pending,
    InProgress,
    Retrying,
    Succeeded,
    Failed,
}

impl OperationState {
    pub fn name(&self) -> &'static str {
        match self {
            OperationState::Pending => "pending",
            OperationState::InProgress => "in progress",
            OperationState::Retrying => "retrying",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
        }
    }

    /// Succeeded and Failed accept no further writes
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::Failed)
    }

    /// Started and not yet finished
    pub fn is_active(&self) -> bool {
        matches!(self, OperationState::InProgress | OperationState::Retrying)
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: OperationState) -> bool {
        use OperationState::*;
        match (self, next) {
            (Pending, InProgress) | (Pending, Failed) => true,
            (InProgress, InProgress) => true,
            (InProgress, Retrying) | (InProgress, Succeeded) | (InProgress, Failed) => true,
            (Retrying, InProgress) | (Retrying, Retrying) => true,
            (Retrying, Succeeded) | (Retrying, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why an operation ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A step declared the failure unrecoverable
    Permanent,
    /// The scheduler gave up after the operation timeout
    Timeout,
    /// A caller abandoned the operation in favour of a newer one
    Superseded,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Permanent => "permanent",
            FailureKind::Timeout => "timeout",
            FailureKind::Superseded => "superseded",
        })
    }
}

/// Parameters resolved once when the operation is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningParameters {
    pub plan_id: String,
    pub plan_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub machine_type: Option<String>,
    /// Optional add-on components requested by the caller
    #[serde(default)]
    pub components: Vec<String>,
}

/// Accumulated input for the provisioning backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCreator {
    #[serde(default)]
    pub runtime_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub components: BTreeSet<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl InputCreator {
    /// Enable a component; returns false when it was already enabled
    pub fn enable_component(&mut self, name: impl Into<String>) -> bool {
        self.components.insert(name.into())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.components.contains(name)
    }

    /// Set by the input initialisation step; later steps depend on it
    pub fn is_initialized(&self) -> bool {
        self.runtime_name.is_some()
    }
}

/// A durable operation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub instance_id: InstanceId,
    pub kind: OperationKind,
    pub state: OperationState,
    pub parameters: ProvisioningParameters,
    #[serde(default)]
    pub input: InputCreator,
    #[serde(default)]
    pub runtime_id: Option<String>,
    pub step_index: usize,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub failure: Option<FailureKind>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
    pub version: u64,
}

impl Operation {
    /// Create a pending operation that is due immediately
    pub fn new(
        id: OperationId,
        instance_id: InstanceId,
        kind: OperationKind,
        parameters: ProvisioningParameters,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            instance_id,
            kind,
            state: OperationState::Pending,
            parameters,
            input: InputCreator::default(),
            runtime_id: None,
            step_index: 0,
            attempts: 0,
            last_error: None,
            failure: None,
            created_at: now,
            started_at: None,
            updated_at: now,
            next_attempt_at: now,
            version: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Due for execution at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_terminal() && self.next_attempt_at <= now
    }

    /// Ordering key of the per-instance queue: oldest first
    pub fn queue_key(&self) -> (DateTime<Utc>, &OperationId) {
        (self.created_at, &self.id)
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
