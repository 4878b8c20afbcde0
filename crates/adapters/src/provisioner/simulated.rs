// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated provisioning backend for local runs
//!
//! Runtimes become ready `ready_after` their creation or upgrade and vanish
//! `removed_after` a deprovision request. Status is derived from the clock on
//! every call, so nothing runs in the background. With a state file the
//! runtimes are shared by every process pointing at it.

use super::{ProvisionerClient, ProvisionerError, RuntimeInfo, RuntimeInput, RuntimeStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eb_core::clock::to_chrono;
use eb_core::{Clock, InstanceId, SimulatorConfig, SystemClock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimRuntime {
    id: String,
    instance_id: InstanceId,
    input: RuntimeInput,
    created_at: DateTime<Utc>,
    #[serde(default)]
    upgraded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    removal_requested_at: Option<DateTime<Utc>>,
}

type Runtimes = BTreeMap<String, SimRuntime>;

/// Clock-driven stand-in for a real provisioner
#[derive(Clone)]
pub struct SimulatedProvisioner<C: Clock = SystemClock> {
    clock: C,
    config: SimulatorConfig,
    runtimes: Arc<Mutex<Runtimes>>,
    state_file: Option<PathBuf>,
}

impl SimulatedProvisioner<SystemClock> {
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SimulatedProvisioner<C> {
    pub fn with_clock(config: SimulatorConfig, clock: C) -> Self {
        Self {
            clock,
            config,
            runtimes: Arc::new(Mutex::new(BTreeMap::new())),
            state_file: None,
        }
    }

    /// Mirror runtimes to a JSON file, re-read before every call
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Run `f` against the current runtimes and persist the result
    fn with_runtimes<T>(
        &self,
        f: impl FnOnce(&mut Runtimes, DateTime<Utc>) -> Result<T, ProvisionerError>,
    ) -> Result<T, ProvisionerError> {
        let mut runtimes = self.runtimes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(path) = &self.state_file {
            *runtimes = load(path)?;
        }

        let now = self.clock.now();
        let removed_after = to_chrono(self.config.removed_after);
        runtimes.retain(|_, rt| match rt.removal_requested_at {
            Some(at) => at + removed_after > now,
            None => true,
        });

        let result = f(&mut runtimes, now)?;
        if let Some(path) = &self.state_file {
            save(path, &runtimes)?;
        }
        Ok(result)
    }

    fn status_of(&self, rt: &SimRuntime, now: DateTime<Utc>) -> RuntimeStatus {
        let ready_after = to_chrono(self.config.ready_after);
        if rt.removal_requested_at.is_some() {
            return RuntimeStatus::Deprovisioning;
        }
        match rt.upgraded_at {
            Some(at) if at + ready_after > now => RuntimeStatus::Upgrading,
            Some(_) => RuntimeStatus::Ready,
            None if rt.created_at + ready_after > now => RuntimeStatus::Provisioning,
            None => RuntimeStatus::Ready,
        }
    }
}

fn load(path: &Path) -> Result<Runtimes, ProvisionerError> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| ProvisionerError::Unavailable(format!("corrupt simulator state: {}", e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(ProvisionerError::Unavailable(e.to_string())),
    }
}

fn save(path: &Path, runtimes: &Runtimes) -> Result<(), ProvisionerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(unavailable)?;
    }
    let json = serde_json::to_vec_pretty(runtimes).map_err(unavailable)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json).map_err(unavailable)?;
    std::fs::rename(&tmp, path).map_err(unavailable)
}

fn unavailable(e: impl std::fmt::Display) -> ProvisionerError {
    ProvisionerError::Unavailable(e.to_string())
}

fn runtime_id_for(instance_id: &InstanceId) -> String {
    format!("rt-{}", instance_id)
}

#[async_trait]
impl<C: Clock> ProvisionerClient for SimulatedProvisioner<C> {
    async fn find_runtime(
        &self,
        instance_id: &InstanceId,
    ) -> Result<Option<RuntimeInfo>, ProvisionerError> {
        self.with_runtimes(|runtimes, now| {
            Ok(runtimes
                .values()
                .find(|rt| &rt.instance_id == instance_id)
                .map(|rt| RuntimeInfo {
                    id: rt.id.clone(),
                    instance_id: rt.instance_id.clone(),
                    status: self.status_of(rt, now),
                }))
        })
    }

    async fn create_runtime(
        &self,
        instance_id: &InstanceId,
        input: &RuntimeInput,
    ) -> Result<String, ProvisionerError> {
        if input.name.is_empty() {
            return Err(ProvisionerError::Rejected(
                "runtime name is required".to_string(),
            ));
        }
        self.with_runtimes(|runtimes, now| {
            let id = runtime_id_for(instance_id);
            // Replayed creates return the existing runtime
            runtimes.entry(id.clone()).or_insert_with(|| SimRuntime {
                id: id.clone(),
                instance_id: instance_id.clone(),
                input: input.clone(),
                created_at: now,
                upgraded_at: None,
                removal_requested_at: None,
            });
            Ok(id)
        })
    }

    async fn runtime_status(&self, runtime_id: &str) -> Result<RuntimeStatus, ProvisionerError> {
        self.with_runtimes(|runtimes, now| {
            runtimes
                .get(runtime_id)
                .map(|rt| self.status_of(rt, now))
                .ok_or_else(|| ProvisionerError::NotFound(runtime_id.to_string()))
        })
    }

    async fn upgrade_runtime(
        &self,
        runtime_id: &str,
        input: &RuntimeInput,
    ) -> Result<(), ProvisionerError> {
        self.with_runtimes(|runtimes, now| {
            let status = match runtimes.get(runtime_id) {
                Some(rt) => self.status_of(rt, now),
                None => return Err(ProvisionerError::NotFound(runtime_id.to_string())),
            };
            match status {
                RuntimeStatus::Deprovisioning => Err(ProvisionerError::Rejected(format!(
                    "runtime {} is being deprovisioned",
                    runtime_id
                ))),
                RuntimeStatus::Provisioning | RuntimeStatus::Upgrading => Err(
                    ProvisionerError::Unavailable(format!("runtime {} is busy", runtime_id)),
                ),
                _ => {
                    if let Some(rt) = runtimes.get_mut(runtime_id) {
                        if rt.input != *input {
                            rt.input = input.clone();
                            rt.upgraded_at = Some(now);
                        }
                    }
                    Ok(())
                }
            }
        })
    }

    async fn deprovision_runtime(&self, runtime_id: &str) -> Result<(), ProvisionerError> {
        self.with_runtimes(|runtimes, now| {
            let rt = runtimes
                .get_mut(runtime_id)
                .ok_or_else(|| ProvisionerError::NotFound(runtime_id.to_string()))?;
            rt.removal_requested_at.get_or_insert(now);
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "simulated_tests.rs"]
mod tests;
