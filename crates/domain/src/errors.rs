//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the RCM client
///
/// Adapters convert their own failures into one of these variants before
/// crossing a port boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum RcmError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The refresh token was rejected; the stored session has been cleared.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Authorization failed and no refresh was possible or allowed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend rejected the request (4xx other than 401/404).
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    /// The response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Session persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// How the boundary should present an error to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorDisposition {
    /// Drop the current view and send the user to the login surface.
    RequireLogin,
    /// Interrupt the user; the outcome of the operation is unknown.
    Alert,
    /// Show next to the form or table that triggered the request.
    Inline,
}

impl RcmError {
    /// Map the error onto the user-visible behaviour it calls for
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            Self::SessionExpired(_) => ErrorDisposition::RequireLogin,
            Self::Network(_) => ErrorDisposition::Alert,
            _ => ErrorDisposition::Inline,
        }
    }

    /// Whether the failure happened before any response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Stable label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::SessionExpired(_) => "session_expired",
            Self::Unauthorized(_) => "unauthorized",
            Self::Rejected(_) => "rejected",
            Self::NotFound(_) => "not_found",
            Self::Server(_) => "server",
            Self::Decode(_) => "decode",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for RCM operations
pub type Result<T> = std::result::Result<T, RcmError>;
