// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod operation;
pub mod status;
pub mod work;

use crate::output::OutputFormat;
use anyhow::{Context as _, Result};
use eb_core::{BrokerConfig, SystemClock, UuidIdGen};
use eb_engine::Broker;
use eb_storage::FileStore;
use std::sync::Arc;

/// Broker over the shared state dir
pub type CliBroker = Broker<FileStore, SystemClock, UuidIdGen>;

/// Settings every command needs
pub struct Context {
    pub config: BrokerConfig,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(config: BrokerConfig, format: OutputFormat) -> Self {
        Self { config, format }
    }

    pub fn store(&self) -> Result<FileStore> {
        let dir = self.config.operations_dir();
        tracing::debug!(dir = %dir.display(), "opening store");
        FileStore::open(&dir).with_context(|| format!("failed to open store at {}", dir.display()))
    }

    pub fn broker(&self) -> Result<CliBroker> {
        Ok(Broker::new(
            self.store()?,
            SystemClock,
            UuidIdGen,
            Arc::new(self.config.catalog()),
        ))
    }
}
