// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::provisioner::{
    ProvisionerClient, ProvisionerError, RuntimeInfo, RuntimeInput, RuntimeStatus,
};
use async_trait::async_trait;
use eb_core::InstanceId;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProvisionerClient
#[derive(Clone)]
pub struct TracedProvisionerClient<P> {
    inner: P,
}

impl<P> TracedProvisionerClient<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

/// Transient failures are expected during polling; log them quieter
fn log_failure(err: &ProvisionerError, elapsed: std::time::Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    if err.is_transient() {
        tracing::warn!(elapsed_ms, error = %err, "transient failure");
    } else {
        tracing::error!(elapsed_ms, error = %err, "failed");
    }
}

#[async_trait]
impl<P: ProvisionerClient> ProvisionerClient for TracedProvisionerClient<P> {
    async fn find_runtime(
        &self,
        instance_id: &InstanceId,
    ) -> Result<Option<RuntimeInfo>, ProvisionerError> {
        let span = tracing::info_span!("provisioner.find_runtime", instance_id = %instance_id);
        async {
            let result = self.inner.find_runtime(instance_id).await;
            match &result {
                Ok(found) => tracing::debug!(
                    runtime_id = found.as_ref().map(|rt| rt.id.as_str()),
                    "looked up"
                ),
                Err(e) => tracing::warn!(error = %e, "lookup failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_runtime(
        &self,
        instance_id: &InstanceId,
        input: &RuntimeInput,
    ) -> Result<String, ProvisionerError> {
        let span = tracing::info_span!(
            "provisioner.create_runtime",
            instance_id = %instance_id,
            name = %input.name
        );
        async {
            tracing::info!(components = input.components.len(), "starting");

            let start = std::time::Instant::now();
            let result = self.inner.create_runtime(instance_id, input).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(runtime_id) => tracing::info!(
                    runtime_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "runtime requested"
                ),
                Err(e) => log_failure(e, elapsed),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn runtime_status(&self, runtime_id: &str) -> Result<RuntimeStatus, ProvisionerError> {
        let result = self.inner.runtime_status(runtime_id).await;
        tracing::trace!(
            runtime_id,
            status = result.as_ref().map(|s| s.name()).ok(),
            "polled"
        );
        result
    }

    async fn upgrade_runtime(
        &self,
        runtime_id: &str,
        input: &RuntimeInput,
    ) -> Result<(), ProvisionerError> {
        let span = tracing::info_span!("provisioner.upgrade_runtime", runtime_id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.upgrade_runtime(runtime_id, input).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "upgrade requested"
                ),
                Err(e) => log_failure(e, elapsed),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn deprovision_runtime(&self, runtime_id: &str) -> Result<(), ProvisionerError> {
        let span = tracing::info_span!("provisioner.deprovision_runtime", runtime_id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.deprovision_runtime(runtime_id).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "removal requested"
                ),
                Err(e) => log_failure(e, elapsed),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
