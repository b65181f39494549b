//! # RCM Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP client with retry for idempotent calls
//! - The authenticated transport and typed resource clients
//! - Session storage backends (JSON file, platform keychain)
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `rcm-core`
//! - Depends on `rcm-domain` and `rcm-core`
//! - Contains all "impure" code (network, filesystem, keychain)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod session;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiError, AuthApi, AuthenticatedTransport, ClaimsApi, JobsApi,
    RuleSetsApi,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
pub use session::{open_session_store, storage_from_config, FileSessionStorage};
#[cfg(feature = "keychain")]
pub use session::KeychainSessionStorage;
