// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::provisioner::FakeProvisionerClient;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn input() -> RuntimeInput {
    RuntimeInput {
        name: "shop".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn traced_passes_results_through() {
    let fake = FakeProvisionerClient::new();
    let traced = TracedProvisionerClient::new(fake.clone());
    let instance = InstanceId::from("inst-1");

    let id = traced.create_runtime(&instance, &input()).await.unwrap();
    assert_eq!(traced.runtime_status(&id).await.unwrap(), RuntimeStatus::Ready);
    assert_eq!(
        traced.find_runtime(&instance).await.unwrap().map(|rt| rt.id),
        Some(id)
    );
    assert_eq!(fake.calls().len(), 3);
}

#[test]
fn traced_create_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedProvisionerClient::new(FakeProvisionerClient::new());
        traced
            .create_runtime(&InstanceId::from("inst-42"), &input())
            .await
    });

    assert!(result.is_ok(), "create should succeed: {:?}", result);
    assert!(
        logs.contains("provisioner.create_runtime"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(logs.contains("inst-42"), "Should log instance. Logs:\n{}", logs);
    assert!(logs.contains("starting"), "Should log entry. Logs:\n{}", logs);
    assert!(
        logs.contains("runtime requested"),
        "Should log completion. Logs:\n{}",
        logs
    );
    assert!(logs.contains("elapsed_ms"), "Should log timing. Logs:\n{}", logs);
}

#[test]
fn traced_transient_failure_logs_warning() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeProvisionerClient::new();
        fake.fail_next(ProvisionerError::Unavailable("maintenance".to_string()));
        let traced = TracedProvisionerClient::new(fake);
        traced.deprovision_runtime("rt-1").await
    });

    assert!(result.is_err());
    assert!(logs.contains("WARN"), "Should warn. Logs:\n{}", logs);
    assert!(
        logs.contains("transient failure"),
        "Should classify failure. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_permanent_failure_logs_error() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedProvisionerClient::new(FakeProvisionerClient::new());
        traced.upgrade_runtime("rt-missing", &input()).await
    });

    assert!(matches!(result, Err(ProvisionerError::NotFound(_))));
    assert!(logs.contains("ERROR"), "Should log error. Logs:\n{}", logs);
    assert!(logs.contains("rt-missing"), "Should log runtime. Logs:\n{}", logs);
}
