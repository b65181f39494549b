//! Validation job tracking
//!
//! A job is submitted once and then observed by a serial polling task until
//! it reaches a terminal status, times out, or is cancelled. All state lives
//! in a [`TrackerSnapshot`] published through a `tokio::sync::watch` channel.

pub mod outcome;
pub mod ports;
pub mod state;
pub mod tracker;

pub use outcome::{JobError, JobOutcome};
pub use state::{ReportEffect, TrackerSnapshot, TrackerState};
pub use tracker::{JobTracker, TrackedJob};
