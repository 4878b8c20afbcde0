// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering of command results as text lines or pretty JSON

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print one report to stdout
pub fn print<T: Serialize + Display>(value: &T, format: OutputFormat) -> Result<()> {
    write_report(&mut io::stdout().lock(), value, format)
}

/// Print reports to stdout, one line each in text mode, one array in JSON
pub fn print_list<T: Serialize + Display>(items: &[T], format: OutputFormat) -> Result<()> {
    write_reports(&mut io::stdout().lock(), items, format)
}

fn write_report<W: Write, T: Serialize + Display>(
    out: &mut W,
    value: &T,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", value)?,
        OutputFormat::Json => write_json(out, value)?,
    }
    Ok(())
}

fn write_reports<W: Write, T: Serialize + Display>(
    out: &mut W,
    items: &[T],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for item in items {
                writeln!(out, "{}", item)?;
            }
        }
        OutputFormat::Json => write_json(out, items)?,
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output as JSON")?;
    writeln!(out, "{}", json)?;
    Ok(())
}
