//! # RCM Domain
//!
//! Business domain types for the claims validation client.
//!
//! This crate contains:
//! - Session types (credential pair, identity)
//! - Validation job, claim and rule set records as the backend serves them
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other RCM crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
