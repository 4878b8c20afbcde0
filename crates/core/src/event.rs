// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit events appended to the operation log

use crate::operation::{FailureKind, OperationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Created {
        instance_id: String,
        kind: String,
    },
    Started,
    StepCompleted {
        step: String,
        index: usize,
    },
    Retrying {
        step: String,
        #[serde(with = "humantime_serde")]
        after: Duration,
        reason: Option<String>,
    },
    Failed {
        reason: String,
        failure: FailureKind,
    },
    Succeeded,
}

impl EventKind {
    /// Event name for log lines (e.g. "step_completed")
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Created { .. } => "created",
            EventKind::Started => "started",
            EventKind::StepCompleted { .. } => "step_completed",
            EventKind::Retrying { .. } => "retrying",
            EventKind::Failed { .. } => "failed",
            EventKind::Succeeded => "succeeded",
        }
    }

    /// Key-value pairs for structured logging
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            EventKind::Created { instance_id, kind } => {
                vec![("instance_id", instance_id.clone()), ("kind", kind.clone())]
            }
            EventKind::Started | EventKind::Succeeded => vec![],
            EventKind::StepCompleted { step, index } => {
                vec![("step", step.clone()), ("index", index.to_string())]
            }
            EventKind::Retrying {
                step,
                after,
                reason,
            } => {
                let mut fields = vec![
                    ("step", step.clone()),
                    ("after", humantime::format_duration(*after).to_string()),
                ];
                if let Some(reason) = reason {
                    fields.push(("reason", reason.clone()));
                }
                fields
            }
            EventKind::Failed { reason, failure } => {
                vec![("reason", reason.clone()), ("failure", failure.to_string())]
            }
        }
    }
}

/// One line of the append-only audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationEvent {
    pub operation_id: OperationId,
    pub at: DateTime<Utc>,
    /// Operation version the event was recorded against
    pub version: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl OperationEvent {
    pub fn new(operation_id: OperationId, at: DateTime<Utc>, version: u64, kind: EventKind) -> Self {
        Self {
            operation_id,
            at,
            version,
            kind,
        }
    }
}

impl std::fmt::Display for OperationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} {}", self.at.to_rfc3339(), self.version, self.kind.name())?;
        for (key, value) in self.kind.fields() {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}
