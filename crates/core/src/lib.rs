//! # RCM Core
//!
//! Client logic with no infrastructure dependencies.
//!
//! This crate contains:
//! - The session store and its persistence/notification ports
//! - The validation job tracker state machine and polling task
//! - The job backend port the tracker polls through
//!
//! ## Architecture Principles
//! - Only depends on `rcm-domain`
//! - No HTTP, keychain, or filesystem code
//! - All external dependencies via traits
//! - Pure, testable state transitions

pub mod jobs;
pub mod session;

// Re-export specific items to avoid ambiguity
pub use jobs::ports::{JobBackend, JobObserver};
pub use jobs::{
    JobError, JobOutcome, JobTracker, ReportEffect, TrackedJob, TrackerSnapshot, TrackerState,
};
pub use session::memory::MemorySessionStorage;
pub use session::ports::{NoopSessionListener, SessionListener, SessionStorage};
pub use session::store::SessionStore;
