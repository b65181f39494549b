//! Backend API client
//!
//! [`AuthenticatedTransport`] owns bearer attachment and the single
//! refresh-and-retry cycle. The resource clients (`auth`, `claims`, `jobs`,
//! `rulesets`) are thin typed wrappers over it, and [`ApiClient`] ties them
//! to one shared session.

pub mod auth;
pub mod claims;
pub mod client;
pub mod errors;
pub mod jobs;
pub mod request;
pub mod rulesets;
pub mod transport;

pub use auth::AuthApi;
pub use claims::ClaimsApi;
pub use client::{ApiClient, ApiClientBuilder};
pub use errors::{extract_error_message, ApiError, ApiErrorCategory};
pub use jobs::JobsApi;
pub use request::{read_upload, ApiRequest, FormField, FormValue, PendingRequest, RequestBody, RetryState};
pub use rulesets::RuleSetsApi;
pub use transport::AuthenticatedTransport;
