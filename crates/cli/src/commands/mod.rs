//! Command handlers, one module per backend resource

pub mod auth;
pub mod claims;
pub mod jobs;
pub mod rulesets;
