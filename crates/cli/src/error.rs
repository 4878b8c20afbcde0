// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! A `CliError` carries:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)

use eb_core::PlanError;
use eb_engine::BrokerError;
use std::fmt;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Builders for the failures users run into most
impl CliError {
    pub fn instance_not_found(instance_id: &str) -> Self {
        CliError::new(format!("Instance '{}' not found", instance_id))
            .with_context("No provision operation has been recorded for it")
            .with_suggestion(format!("Provision it first: eb provision {} --plan azure", instance_id))
            .with_suggestion("Check the state dir: eb --state-dir <dir> list <instance>")
    }

    pub fn operation_not_found(operation_id: &str) -> Self {
        CliError::new(format!("Operation '{}' not found", operation_id))
            .with_suggestion("List an instance's operations: eb list <instance>")
    }

    pub fn already_finished(operation_id: &str) -> Self {
        CliError::new(format!("Operation '{}' is already finished", operation_id))
            .with_context("Only pending, in-progress or retrying operations can be superseded")
            .with_suggestion(format!("Show its final state: eb status {}", operation_id))
    }

    pub fn plan(err: PlanError) -> Self {
        let message = err.to_string();
        let base = CliError::new(message);
        let base = match &err {
            PlanError::NotEnabled(_) => {
                base.with_context("The plan exists but is not listed in enable_plans")
            }
            PlanError::Empty => base.with_context("enable_plans is empty"),
            PlanError::Unrecognized(_) => base,
        };
        base.with_suggestion("List enabled plans: eb plans")
            .with_source(err)
    }
}

impl From<BrokerError> for CliError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::InstanceNotFound(id) => CliError::instance_not_found(id.as_str()),
            BrokerError::OperationNotFound(id) => CliError::operation_not_found(id.as_str()),
            BrokerError::AlreadyFinished(id) => CliError::already_finished(id.as_str()),
            BrokerError::Plan(e) => CliError::plan(e),
            other => CliError::new(other.to_string())
                .with_context("The state dir may be unreadable or busy")
                .with_source(other),
        }
    }
}
