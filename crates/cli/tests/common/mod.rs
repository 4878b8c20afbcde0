// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A state dir plus a config file pointing at it.
/// Everything is cleaned up when dropped.
pub struct TestEnv {
    temp: TempDir,
    config: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// Extra TOML is appended to the top-level table
    pub fn with_config(extra: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let state_dir = temp.path().join("state");
        let config = temp.path().join("config.toml");
        let content = format!(
            r#"state_dir = "{}"
workers = 2
poll_interval = "10ms"
min_retry = "1s"
status_poll_interval = "1s"
enable_plans = "azure,gcp"
{}

[simulator]
ready_after = "0s"
removed_after = "0s"
"#,
            state_dir.display(),
            extra
        );
        fs::write(&config, content).expect("Failed to write config");
        Self { temp, config }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// `eb` with this env's config and no leaked overrides
    pub fn eb(&self) -> Command {
        let mut cmd = Command::cargo_bin("eb").expect("eb binary");
        cmd.arg("--config")
            .arg(&self.config)
            .env_remove("EB_CONFIG")
            .env_remove("EB_STATE_DIR")
            .env_remove("EB_ENABLE_PLANS")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run `eb` and return trimmed stdout, asserting success
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.eb().args(args).assert().success().get_output().clone();
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Run `eb -o json` and parse stdout
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .eb()
            .args(["-o", "json"])
            .args(args)
            .assert()
            .success()
            .get_output()
            .clone();
        serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
    }
}
