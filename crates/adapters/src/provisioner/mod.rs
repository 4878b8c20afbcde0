// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning backend client

mod simulated;

pub use simulated::SimulatedProvisioner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProvisionerClient, ProvisionerCall};

use async_trait::async_trait;
use eb_core::{InputCreator, InstanceId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the provisioning backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionerError {
    #[error("provisioner unavailable: {0}")]
    Unavailable(String),
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("runtime not found: {0}")]
    NotFound(String),
}

impl ProvisionerError {
    /// Worth retrying later; the request itself was fine
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProvisionerError::Unavailable(_) | ProvisionerError::RateLimited { .. }
        )
    }

    /// Backend-suggested delay, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProvisionerError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Lifecycle of a runtime as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuntimeStatus {
    Provisioning,
    Ready,
    Upgrading,
    Deprovisioning,
    Failed { reason: String },
}

impl RuntimeStatus {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeStatus::Provisioning => "provisioning",
            RuntimeStatus::Ready => "ready",
            RuntimeStatus::Upgrading => "upgrading",
            RuntimeStatus::Deprovisioning => "deprovisioning",
            RuntimeStatus::Failed { .. } => "failed",
        }
    }
}

/// A runtime known to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub id: String,
    pub instance_id: InstanceId,
    pub status: RuntimeStatus,
}

/// Request body for creating or upgrading a runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInput {
    pub name: String,
    pub region: Option<String>,
    pub machine_type: Option<String>,
    pub components: Vec<String>,
    pub labels: Vec<(String, String)>,
}

impl From<&InputCreator> for RuntimeInput {
    fn from(input: &InputCreator) -> Self {
        Self {
            name: input.runtime_name.clone().unwrap_or_default(),
            region: input.region.clone(),
            machine_type: input.machine_type.clone(),
            components: input.components.iter().cloned().collect(),
            labels: input
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Client for the provisioning backend.
///
/// Every call may be repeated after a crash, so implementations must make
/// `create_runtime` and `deprovision_runtime` safe to replay.
#[async_trait]
pub trait ProvisionerClient: Clone + Send + Sync + 'static {
    /// Look up the runtime belonging to an instance
    async fn find_runtime(
        &self,
        instance_id: &InstanceId,
    ) -> Result<Option<RuntimeInfo>, ProvisionerError>;

    /// Start creating a runtime, returning its ID
    async fn create_runtime(
        &self,
        instance_id: &InstanceId,
        input: &RuntimeInput,
    ) -> Result<String, ProvisionerError>;

    async fn runtime_status(&self, runtime_id: &str) -> Result<RuntimeStatus, ProvisionerError>;

    async fn upgrade_runtime(
        &self,
        runtime_id: &str,
        input: &RuntimeInput,
    ) -> Result<(), ProvisionerError>;

    /// Request removal of a runtime
    async fn deprovision_runtime(&self, runtime_id: &str) -> Result<(), ProvisionerError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
