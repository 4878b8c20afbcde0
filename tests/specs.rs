//! Behavioral specifications for the environment broker.
//!
//! These tests drive the broker facade and workers end to end against the
//! in-memory and file stores with a fake clock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/scenarios.rs"]
mod scenarios;

#[path = "specs/queueing.rs"]
mod queueing;

#[path = "specs/restart.rs"]
mod restart;
