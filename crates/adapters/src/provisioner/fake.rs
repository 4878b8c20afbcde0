// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake provisioner client for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProvisionerClient, ProvisionerError, RuntimeInfo, RuntimeInput, RuntimeStatus};
use async_trait::async_trait;
use eb_core::InstanceId;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded provisioner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionerCall {
    FindRuntime { instance_id: InstanceId },
    CreateRuntime { instance_id: InstanceId, input: RuntimeInput },
    RuntimeStatus { runtime_id: String },
    UpgradeRuntime { runtime_id: String, input: RuntimeInput },
    DeprovisionRuntime { runtime_id: String },
}

struct FakeState {
    runtimes: BTreeMap<String, RuntimeInfo>,
    /// Statuses handed out by `runtime_status` before falling back to the stored one
    scripted: HashMap<String, VecDeque<RuntimeStatus>>,
    failures: VecDeque<ProvisionerError>,
    reject_creates: Option<String>,
    initial_status: RuntimeStatus,
    calls: Vec<ProvisionerCall>,
    next_id: u64,
}

/// Fake provisioner client for testing
#[derive(Clone)]
pub struct FakeProvisionerClient {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeProvisionerClient {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                runtimes: BTreeMap::new(),
                scripted: HashMap::new(),
                failures: VecDeque::new(),
                reject_creates: None,
                initial_status: RuntimeStatus::Ready,
                calls: Vec::new(),
                next_id: 1,
            })),
        }
    }
}

impl FakeProvisionerClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Status given to newly created runtimes (default `Ready`)
    pub fn set_initial_status(&self, status: RuntimeStatus) {
        self.lock().initial_status = status;
    }

    /// Fail the next call (of any kind) with `error`
    pub fn fail_next(&self, error: ProvisionerError) {
        self.lock().failures.push_back(error);
    }

    /// Reject every `create_runtime` call from now on
    pub fn reject_creates(&self, reason: impl Into<String>) {
        self.lock().reject_creates = Some(reason.into());
    }

    /// Queue statuses for successive `runtime_status` calls
    pub fn script_status(&self, runtime_id: &str, statuses: Vec<RuntimeStatus>) {
        self.lock()
            .scripted
            .entry(runtime_id.to_string())
            .or_default()
            .extend(statuses);
    }

    /// Seed an existing runtime
    pub fn insert_runtime(&self, info: RuntimeInfo) {
        self.lock().runtimes.insert(info.id.clone(), info);
    }

    pub fn runtime(&self, runtime_id: &str) -> Option<RuntimeInfo> {
        self.lock().runtimes.get(runtime_id).cloned()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProvisionerCall> {
        self.lock().calls.clone()
    }

    /// Number of `create_runtime` calls seen so far
    pub fn create_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ProvisionerCall::CreateRuntime { .. }))
            .count()
    }

    fn record(&self, call: ProvisionerCall) -> Result<(), ProvisionerError> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProvisionerClient for FakeProvisionerClient {
    async fn find_runtime(
        &self,
        instance_id: &InstanceId,
    ) -> Result<Option<RuntimeInfo>, ProvisionerError> {
        self.record(ProvisionerCall::FindRuntime {
            instance_id: instance_id.clone(),
        })?;
        Ok(self
            .lock()
            .runtimes
            .values()
            .find(|rt| &rt.instance_id == instance_id)
            .cloned())
    }

    async fn create_runtime(
        &self,
        instance_id: &InstanceId,
        input: &RuntimeInput,
    ) -> Result<String, ProvisionerError> {
        self.record(ProvisionerCall::CreateRuntime {
            instance_id: instance_id.clone(),
            input: input.clone(),
        })?;
        let mut state = self.lock();
        if let Some(reason) = &state.reject_creates {
            return Err(ProvisionerError::Rejected(reason.clone()));
        }
        let id = format!("rt-{}", state.next_id);
        state.next_id += 1;
        let status = state.initial_status.clone();
        state.runtimes.insert(
            id.clone(),
            RuntimeInfo {
                id: id.clone(),
                instance_id: instance_id.clone(),
                status,
            },
        );
        Ok(id)
    }

    async fn runtime_status(&self, runtime_id: &str) -> Result<RuntimeStatus, ProvisionerError> {
        self.record(ProvisionerCall::RuntimeStatus {
            runtime_id: runtime_id.to_string(),
        })?;
        let mut state = self.lock();
        if let Some(next) = state
            .scripted
            .get_mut(runtime_id)
            .and_then(VecDeque::pop_front)
        {
            if let Some(rt) = state.runtimes.get_mut(runtime_id) {
                rt.status = next.clone();
            }
            return Ok(next);
        }
        state
            .runtimes
            .get(runtime_id)
            .map(|rt| rt.status.clone())
            .ok_or_else(|| ProvisionerError::NotFound(runtime_id.to_string()))
    }

    async fn upgrade_runtime(
        &self,
        runtime_id: &str,
        input: &RuntimeInput,
    ) -> Result<(), ProvisionerError> {
        self.record(ProvisionerCall::UpgradeRuntime {
            runtime_id: runtime_id.to_string(),
            input: input.clone(),
        })?;
        let state = self.lock();
        if !state.runtimes.contains_key(runtime_id) {
            return Err(ProvisionerError::NotFound(runtime_id.to_string()));
        }
        Ok(())
    }

    async fn deprovision_runtime(&self, runtime_id: &str) -> Result<(), ProvisionerError> {
        self.record(ProvisionerCall::DeprovisionRuntime {
            runtime_id: runtime_id.to_string(),
        })?;
        // Removal is immediate; status lookups report NotFound afterwards
        self.lock()
            .runtimes
            .remove(runtime_id)
            .map(|_| ())
            .ok_or_else(|| ProvisionerError::NotFound(runtime_id.to_string()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
