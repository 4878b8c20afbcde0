// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run workers inside the CLI process

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};
use clap::Args;
use eb_adapters::{SimulatedProvisioner, TracedProvisionerClient};
use eb_core::{HolderId, OperationId, OperationState, SystemClock};
use eb_engine::{default_registry, PipelineRegistry, Worker, WorkerConfig, WorkerPool};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Upper bound on cycles for `--once`, in case a zero `min_retry` keeps an
/// operation permanently due
const MAX_ONCE_CYCLES: usize = 1000;

#[derive(Args, Debug)]
pub struct WorkArgs {
    /// Execute every due operation once, then exit
    #[arg(long)]
    pub once: bool,
}

/// One executed operation
#[derive(Debug, Serialize)]
pub struct CycleReport {
    pub operation_id: OperationId,
    pub steps_run: usize,
    pub state: OperationState,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<12} steps run: {}",
            self.operation_id.to_string(),
            self.state.to_string(),
            self.steps_run
        )
    }
}

fn registry(ctx: &Context) -> Arc<PipelineRegistry> {
    let provisioner = TracedProvisionerClient::new(
        SimulatedProvisioner::new(ctx.config.simulator.clone())
            .with_state_file(ctx.config.simulator_state_path()),
    );
    Arc::new(default_registry(
        provisioner,
        Arc::new(ctx.config.catalog()),
        ctx.config.status_poll_interval,
    ))
}

fn holder() -> HolderId {
    HolderId::new(format!("eb-{}", std::process::id()))
}

pub async fn work(ctx: &Context, args: WorkArgs) -> Result<()> {
    if args.once {
        work_once(ctx).await
    } else {
        work_forever(ctx).await
    }
}

async fn work_once(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let worker = Worker::new(
        store.clone(),
        store,
        SystemClock,
        registry(ctx),
        WorkerConfig::from_config(&ctx.config, holder()),
    );

    let mut reports = Vec::new();
    for _ in 0..MAX_ONCE_CYCLES {
        let Some(executed) = worker.run_once().await.context("worker cycle failed")? else {
            break;
        };
        reports.push(CycleReport {
            operation_id: executed.operation_id,
            steps_run: executed.steps_run,
            state: executed.state,
        });
    }

    if reports.is_empty() && matches!(ctx.format, OutputFormat::Text) {
        println!("No operations due");
        return Ok(());
    }
    output::print_list(&reports, ctx.format)?;
    Ok(())
}

async fn work_forever(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let pool = WorkerPool::start(
        ctx.config.workers,
        store.clone(),
        store,
        SystemClock,
        registry(ctx),
        WorkerConfig::from_config(&ctx.config, holder()),
    );
    eprintln!("Running {} workers, Ctrl-C to stop", pool.len());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    pool.shutdown().await;
    Ok(())
}
