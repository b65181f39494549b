//! Conversions from external infrastructure errors into domain errors.

use rcm_domain::RcmError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RcmError);

impl From<InfraError> for RcmError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RcmError> for InfraError {
    fn from(value: RcmError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRcmError {
    fn into_rcm(self) -> RcmError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RcmError */
/* -------------------------------------------------------------------------- */

impl IntoRcmError for HttpError {
    fn into_rcm(self) -> RcmError {
        if self.is_timeout() {
            return RcmError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return RcmError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return RcmError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return RcmError::Decode(format!("unexpected response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => RcmError::Unauthorized(message),
                404 => RcmError::NotFound(message),
                400..=499 => RcmError::Rejected(message),
                _ => RcmError::Server(message),
            };
        }

        RcmError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_rcm())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io / serde_json / toml → RcmError */
/* -------------------------------------------------------------------------- */

impl IntoRcmError for std::io::Error {
    fn into_rcm(self) -> RcmError {
        match self.kind() {
            std::io::ErrorKind::NotFound => RcmError::NotFound(self.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                RcmError::Storage(format!("permission denied: {self}"))
            }
            _ => RcmError::Storage(self.to_string()),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_rcm())
    }
}

impl IntoRcmError for serde_json::Error {
    fn into_rcm(self) -> RcmError {
        RcmError::Decode(format!("invalid JSON at line {} column {}: {self}", self.line(), self.column()))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_rcm())
    }
}

impl IntoRcmError for toml::de::Error {
    fn into_rcm(self) -> RcmError {
        RcmError::Config(format!("invalid TOML: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_rcm())
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → RcmError */
/* -------------------------------------------------------------------------- */

#[cfg(feature = "keychain")]
impl IntoRcmError for keyring::Error {
    fn into_rcm(self) -> RcmError {
        use keyring::Error as KE;

        match self {
            KE::NoEntry => RcmError::NotFound("keychain entry not found".into()),
            KE::BadEncoding(_) => {
                RcmError::Storage("credential in keychain is not valid UTF-8".into())
            }
            KE::PlatformFailure(err) => {
                RcmError::Storage(format!("keychain platform error: {err}"))
            }
            KE::NoStorageAccess(err) => {
                RcmError::Storage(format!("unable to access secure storage: {err}"))
            }
            other => RcmError::Storage(other.to_string()),
        }
    }
}

#[cfg(feature = "keychain")]
impl From<keyring::Error> for InfraError {
    fn from(value: keyring::Error) -> Self {
        InfraError(value.into_rcm())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
