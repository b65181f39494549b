//! Tracing subscriber setup
//!
//! `RUST_LOG`, when set, wins over the configured level. Output is either the
//! human-readable `fmt` format or one JSON object per line.

use rcm_domain::{LoggingConfig, RcmError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Filter built from `RUST_LOG`, falling back to `config.level`
///
/// # Errors
/// Returns `RcmError::Config` if the configured level is not a valid filter
/// directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| RcmError::Config(format!("Invalid log level {:?}: {e}", config.level)))
}

/// Install the global subscriber
///
/// Logs go to stderr so command output on stdout stays machine-readable.
///
/// # Errors
/// Returns `RcmError::Config` for an invalid level, or `RcmError::Internal`
/// if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)).try_init()
    };

    installed.map_err(|e| RcmError::Internal(format!("tracing already initialised: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_applies_without_rust_log() {
        temp_env::with_var("RUST_LOG", None::<&str>, || {
            let config = LoggingConfig { level: "rcm_infra=debug,warn".into(), json: false };
            let filter = env_filter(&config).unwrap();
            assert!(filter.to_string().contains("rcm_infra=debug"));
        });
    }

    #[test]
    fn rust_log_wins() {
        temp_env::with_var("RUST_LOG", Some("trace"), || {
            let filter = env_filter(&LoggingConfig::default()).unwrap();
            assert_eq!(filter.to_string(), "trace");
        });
    }

    #[test]
    fn invalid_level_is_config_error() {
        temp_env::with_var("RUST_LOG", None::<&str>, || {
            let config = LoggingConfig { level: "rcm_infra=loud".into(), json: true };
            assert!(matches!(env_filter(&config), Err(RcmError::Config(_))));
        });
    }

    #[test]
    fn second_init_is_an_error() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(RcmError::Internal(_))));
    }
}
