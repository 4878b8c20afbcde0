// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted step for tests
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::step::Step;
use async_trait::async_trait;
use eb_core::{Operation, StepOutcome};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Step that hands out queued outcomes, then `Done` forever.
///
/// Clones share the script and the call counter.
#[derive(Clone)]
pub struct ScriptedStep {
    name: String,
    outcomes: Arc<Mutex<VecDeque<StepOutcome>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    effect: Option<fn(&mut Operation)>,
}

impl ScriptedStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
            effect: None,
        }
    }

    /// Queue outcomes for successive runs
    pub fn with_outcomes(self, outcomes: impl IntoIterator<Item = StepOutcome>) -> Self {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(outcomes);
        self
    }

    /// Sleep before returning, to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Mutate the operation on every run
    pub fn with_effect(mut self, effect: fn(&mut Operation)) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Step for ScriptedStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, mut op: Operation) -> (Operation, StepOutcome) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(effect) = self.effect {
            effect(&mut op);
        }
        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(StepOutcome::Done);
        (op, outcome)
    }
}
