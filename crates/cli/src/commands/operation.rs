// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands that queue or supersede operations

use super::Context;
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use eb_core::{InstanceId, OperationId, OperationKind, ProvisionRequest};
use eb_engine::{Deprovisioner, Provisioner, Updater};
use serde::Serialize;
use std::fmt;

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Instance ID
    pub instance: String,

    /// Plan name (see `eb plans`)
    #[arg(long)]
    pub plan: String,

    /// Runtime name (defaults to the instance ID)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub machine_type: Option<String>,

    /// Optional component to install, repeatable
    #[arg(long = "component", value_name = "NAME")]
    pub components: Vec<String>,
}

impl ProvisionArgs {
    fn request(&self) -> ProvisionRequest {
        ProvisionRequest {
            plan: self.plan.clone(),
            name: self.name.clone(),
            region: self.region.clone(),
            machine_type: self.machine_type.clone(),
            components: self.components.clone(),
        }
    }
}

/// A queued operation; text output is the bare ID so scripts can capture it
#[derive(Debug, Serialize)]
pub struct Queued {
    pub operation_id: OperationId,
    pub instance_id: InstanceId,
    pub kind: OperationKind,
}

impl fmt::Display for Queued {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation_id)
    }
}

fn report(
    ctx: &Context,
    instance_id: InstanceId,
    kind: OperationKind,
    operation_id: OperationId,
) -> Result<()> {
    let queued = Queued {
        operation_id,
        instance_id,
        kind,
    };
    output::print(&queued, ctx.format)
}

pub fn provision(ctx: &Context, args: ProvisionArgs) -> Result<()> {
    let broker = ctx.broker()?;
    let instance_id = InstanceId::new(args.instance.as_str());
    let id = broker
        .provision(&instance_id, &args.request())
        .map_err(CliError::from)?;
    report(ctx, instance_id, OperationKind::Provision, id)
}

pub fn deprovision(ctx: &Context, instance: &str) -> Result<()> {
    let broker = ctx.broker()?;
    let instance_id = InstanceId::new(instance);
    let id = broker.deprovision(&instance_id).map_err(CliError::from)?;
    report(ctx, instance_id, OperationKind::Deprovision, id)
}

pub fn update(ctx: &Context, args: ProvisionArgs) -> Result<()> {
    let broker = ctx.broker()?;
    let instance_id = InstanceId::new(args.instance.as_str());
    let id = broker
        .update(&instance_id, &args.request())
        .map_err(CliError::from)?;
    report(ctx, instance_id, OperationKind::Update, id)
}

pub fn supersede(ctx: &Context, operation: &str, reason: &str) -> Result<()> {
    let broker = ctx.broker()?;
    let report = broker
        .supersede(&OperationId::new(operation), reason)
        .map_err(CliError::from)?;
    match ctx.format {
        OutputFormat::Text => println!("Superseded {}: {}", report.operation_id, report.description),
        OutputFormat::Json => output::print(&report, ctx.format)?,
    }
    Ok(())
}
