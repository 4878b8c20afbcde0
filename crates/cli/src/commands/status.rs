// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only queries against the store

use super::Context;
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use eb_core::{InstanceId, OperationId, Plan};
use eb_engine::StatusReader;
use serde::Serialize;
use std::fmt;

pub fn status(ctx: &Context, operation: &str) -> Result<()> {
    let broker = ctx.broker()?;
    let report = broker
        .last_operation(&OperationId::new(operation))
        .map_err(CliError::from)?;
    output::print(&report, ctx.format)?;
    Ok(())
}

pub fn list(ctx: &Context, instance: &str) -> Result<()> {
    let broker = ctx.broker()?;
    let reports = broker
        .list(&InstanceId::new(instance))
        .map_err(CliError::from)?;
    if reports.is_empty() && matches!(ctx.format, OutputFormat::Text) {
        println!("No operations for {}", instance);
        return Ok(());
    }
    output::print_list(&reports, ctx.format)?;
    Ok(())
}

pub fn events(ctx: &Context, operation: &str) -> Result<()> {
    let broker = ctx.broker()?;
    let events = broker
        .events(&OperationId::new(operation))
        .map_err(CliError::from)?;
    output::print_list(&events, ctx.format)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PlanInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub default_region: &'static str,
    pub default_machine_type: &'static str,
    pub regions: &'static [&'static str],
    pub optional_components: &'static [&'static str],
}

impl From<&'static Plan> for PlanInfo {
    fn from(plan: &'static Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            default_region: plan.default_region,
            default_machine_type: plan.default_machine_type,
            regions: plan.regions,
            optional_components: plan.optional_components,
        }
    }
}

impl fmt::Display for PlanInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {}  region={} machine_type={}",
            self.name, self.id, self.default_region, self.default_machine_type
        )
    }
}

pub fn plans(ctx: &Context) -> Result<()> {
    let plans: Vec<PlanInfo> = ctx.config.catalog().plans().map(PlanInfo::from).collect();
    output::print_list(&plans, ctx.format)
}
