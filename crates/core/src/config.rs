// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file or a
//! partial file is valid. Durations use humantime syntax (`"30s"`, `"2h"`).

use crate::plan::{EnablePlans, PlanCatalog, PlanError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `state_dir`
pub const STATE_DIR_ENV: &str = "EB_STATE_DIR";
/// Environment variable overriding `enable_plans`
pub const ENABLE_PLANS_ENV: &str = "EB_ENABLE_PLANS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {ENABLE_PLANS_ENV}: {0}")]
    Plans(#[from] PlanError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for the in-process simulated provisioning backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// How long a created or upgraded runtime takes to become ready
    #[serde(with = "humantime_serde")]
    pub ready_after: Duration,
    /// How long a deprovisioned runtime takes to disappear
    #[serde(with = "humantime_serde")]
    pub removed_after: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ready_after: Duration::from_secs(60),
            removed_after: Duration::from_secs(30),
        }
    }
}

/// Top-level configuration shared by the daemon and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Directory holding operations, leases, the audit log and daemon logs
    pub state_dir: PathBuf,
    /// Number of parallel workers
    pub workers: usize,
    /// Sleep between polls when nothing was due
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Lease TTL per operation
    #[serde(with = "humantime_serde")]
    pub lease_ttl: Duration,
    /// Overall ceiling from start to terminal state
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
    /// Ceiling for a single step invocation
    #[serde(with = "humantime_serde")]
    pub step_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub min_retry: Duration,
    #[serde(with = "humantime_serde")]
    pub max_retry: Duration,
    /// Delay between runtime status polls
    #[serde(with = "humantime_serde")]
    pub status_poll_interval: Duration,
    pub enable_plans: EnablePlans,
    pub simulator: SimulatorConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            workers: 4,
            poll_interval: Duration::from_secs(1),
            lease_ttl: Duration::from_secs(120),
            operation_timeout: Duration::from_secs(3 * 60 * 60),
            step_timeout: Duration::from_secs(60),
            min_retry: Duration::from_secs(1),
            max_retry: Duration::from_secs(10 * 60),
            status_poll_interval: Duration::from_secs(30),
            enable_plans: EnablePlans::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// Parse configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BrokerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` (defaults when it does not exist), then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_toml(&content)?
            }
            Some(path) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup(STATE_DIR_ENV).filter(|d| !d.is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(plans) = lookup(ENABLE_PLANS_ENV).filter(|p| !p.is_empty()) {
            self.enable_plans = EnablePlans::parse(&plans)?;
        }
        self.validate()
    }

    pub fn catalog(&self) -> PlanCatalog {
        PlanCatalog::new(&self.enable_plans)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.min_retry > self.max_retry {
            return Err(ConfigError::Invalid(
                "min_retry must not exceed max_retry".to_string(),
            ));
        }
        if self.lease_ttl <= self.step_timeout {
            return Err(ConfigError::Invalid(
                "lease_ttl must be longer than step_timeout".to_string(),
            ));
        }
        Ok(())
    }

    pub fn operations_dir(&self) -> PathBuf {
        self.state_dir.join("store")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("logs").join("ebd.log")
    }

    /// Held exclusively by the running daemon; contains its PID
    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("ebd.pid")
    }

    /// Runtimes of the simulated backend, shared by the daemon and the CLI
    pub fn simulator_state_path(&self) -> PathBuf {
        self.state_dir.join("simulator.json")
    }
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("state")))
        .map(|d| d.join("eb"))
        .unwrap_or_else(|| PathBuf::from(".eb"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
