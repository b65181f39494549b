//! Low-level HTTP plumbing shared by the API clients

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, RetryPolicy};
