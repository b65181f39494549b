//! API-specific error types
//!
//! Provides error classification for API operations and the message
//! extraction used for rejected requests.

use rcm_domain::RcmError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401 that a refresh could not fix
    Authentication,
    /// 4xx other than 401
    Client,
    /// 5xx
    Server,
    /// No response at all
    Network,
    /// Response arrived but could not be decoded
    Decode,
    /// Session persistence failed around a refresh
    Storage,
    Config,
}

/// API operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    /// The refresh token was rejected and the session has been cleared.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::SessionExpired(_) | Self::Unauthorized(_) => ApiErrorCategory::Authentication,
            Self::Rejected { .. } | Self::NotFound(_) => ApiErrorCategory::Client,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Storage(_) => ApiErrorCategory::Storage,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Whether repeating the same call later could succeed
    pub fn should_retry(&self) -> bool {
        matches!(self.category(), ApiErrorCategory::Server | ApiErrorCategory::Network)
    }

    /// HTTP status that produced this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Unauthorized(_) | Self::SessionExpired(_) => Some(401),
            _ => None,
        }
    }

    /// Map a non-success response to an error, using the body for the message
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(status, body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            s if s.is_server_error() => Self::Server { status: s.as_u16(), message },
            s => Self::Rejected { status: s.as_u16(), message },
        }
    }
}

impl From<ApiError> for RcmError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(m) => RcmError::Network(m),
            ApiError::SessionExpired(m) => RcmError::SessionExpired(m),
            ApiError::Unauthorized(m) => RcmError::Unauthorized(m),
            ApiError::Rejected { message, .. } => RcmError::Rejected(message),
            ApiError::NotFound(m) => RcmError::NotFound(m),
            ApiError::Server { message, .. } => RcmError::Server(message),
            ApiError::Decode(m) => RcmError::Decode(m),
            ApiError::Storage(m) => RcmError::Storage(m),
            ApiError::Config(m) => RcmError::Config(m),
        }
    }
}

impl From<RcmError> for ApiError {
    fn from(err: RcmError) -> Self {
        match err {
            RcmError::Network(m) => Self::Network(m),
            RcmError::SessionExpired(m) => Self::SessionExpired(m),
            RcmError::Unauthorized(m) => Self::Unauthorized(m),
            RcmError::Rejected(m) | RcmError::InvalidInput(m) => {
                Self::Rejected { status: 400, message: m }
            }
            RcmError::NotFound(m) => Self::NotFound(m),
            RcmError::Server(m) | RcmError::Internal(m) => Self::Server { status: 500, message: m },
            RcmError::Decode(m) => Self::Decode(m),
            RcmError::Storage(m) => Self::Storage(m),
            RcmError::Config(m) => Self::Config(m),
        }
    }
}

/// Human-readable message for a failed request
///
/// Tries, in order: a body that is a bare JSON string, the `error`, `detail`
/// and `message` fields, the first `non_field_errors` entry, the first field
/// whose value is a non-empty list of errors, and finally the status line.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| message_from_body(&value))
        .unwrap_or_else(|| {
            format!("Server error: {} {}", status.as_u16(), status.canonical_reason().unwrap_or(""))
                .trim_end()
                .to_string()
        })
}

fn message_from_body(body: &Value) -> Option<String> {
    if let Some(text) = body.as_str() {
        return non_empty(text);
    }

    let object = body.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(text) = object.get(key).and_then(text_of) {
            return Some(text);
        }
    }

    if let Some(first) = object
        .get("non_field_errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(text_of)
    {
        return Some(first);
    }

    // Only the first field in document order is considered.
    let (field, errors) = object.iter().next()?;
    let first = errors.as_array()?.first()?;
    Some(format!("{field}: {}", text_of(first).unwrap_or_else(|| first.to_string())))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
