// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease state machine for per-operation mutual exclusion
//!
//! A lease is a time-bounded exclusive claim on a key (an operation ID). An
//! expired lease is reclaimed by the next acquirer, so a crashed worker never
//! blocks an operation for longer than the lease TTL.

use crate::clock::to_chrono;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unique identifier for a lease holder (one per worker)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lease state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LeaseState {
    /// Nobody holds the lease
    Free,
    /// Held until `expires_at`
    Held {
        holder: HolderId,
        acquired_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

/// A lease over a single key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub key: String,
    pub state: LeaseState,
}

/// Requests that can change a lease
#[derive(Clone, Debug)]
pub enum LeaseInput {
    Acquire { holder: HolderId, ttl: Duration },
    Renew { holder: HolderId, ttl: Duration },
    Release { holder: HolderId },
}

/// What a transition decided
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaseDecision {
    Granted,
    /// An expired lease was taken over from `previous`
    Reclaimed { previous: HolderId },
    Denied { current: HolderId },
    Renewed,
    Released,
    /// Renew or release by a non-holder; nothing changed
    Ignored,
}

impl LeaseDecision {
    /// Whether the requester holds the lease after the transition
    pub fn is_held(&self) -> bool {
        matches!(
            self,
            LeaseDecision::Granted | LeaseDecision::Reclaimed { .. } | LeaseDecision::Renewed
        )
    }
}

impl Lease {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: LeaseState::Free,
        }
    }

    /// Check if the lease is free or expired at `now`
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        match &self.state {
            LeaseState::Free => true,
            LeaseState::Held { expires_at, .. } => *expires_at <= now,
        }
    }

    /// Check if `holder` holds an unexpired lease at `now`
    pub fn is_held_by(&self, holder: &HolderId, now: DateTime<Utc>) -> bool {
        matches!(&self.state, LeaseState::Held { holder: h, expires_at, .. } if h == holder && *expires_at > now)
    }

    pub fn holder(&self) -> Option<&HolderId> {
        match &self.state {
            LeaseState::Free => None,
            LeaseState::Held { holder, .. } => Some(holder),
        }
    }

    /// Pure state transition function
    pub fn transition(&self, input: LeaseInput, now: DateTime<Utc>) -> (Lease, LeaseDecision) {
        let mut next = self.clone();

        let decision = match input {
            LeaseInput::Acquire { holder, ttl } => match &self.state {
                LeaseState::Free => {
                    next.state = held(holder, now, ttl);
                    LeaseDecision::Granted
                }
                LeaseState::Held {
                    holder: current, ..
                } if current == &holder && !self.is_available(now) => {
                    // Re-acquire by the same holder extends the lease
                    next.state = held(holder, now, ttl);
                    LeaseDecision::Renewed
                }
                LeaseState::Held {
                    holder: current, ..
                } => {
                    if self.is_available(now) {
                        let previous = current.clone();
                        next.state = held(holder, now, ttl);
                        LeaseDecision::Reclaimed { previous }
                    } else {
                        LeaseDecision::Denied {
                            current: current.clone(),
                        }
                    }
                }
            },

            LeaseInput::Renew { holder, ttl } => {
                // An expired lease cannot be renewed: someone may already
                // have reclaimed it in between.
                if self.is_held_by(&holder, now) {
                    next.state = held(holder, now, ttl);
                    LeaseDecision::Renewed
                } else {
                    LeaseDecision::Ignored
                }
            }

            LeaseInput::Release { holder } => match &self.state {
                LeaseState::Held {
                    holder: current, ..
                } if current == &holder => {
                    next.state = LeaseState::Free;
                    LeaseDecision::Released
                }
                _ => LeaseDecision::Ignored,
            },
        };

        (next, decision)
    }
}

fn held(holder: HolderId, now: DateTime<Utc>, ttl: Duration) -> LeaseState {
    LeaseState::Held {
        holder,
        acquired_at: now,
        expires_at: now + to_chrono(ttl),
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
