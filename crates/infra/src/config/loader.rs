//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Probe the standard locations for a config file (JSON or TOML)
//! 2. Fall back to built-in defaults when none exists
//! 3. Apply environment overrides on top
//!
//! ## Environment Variables
//! - `RCM_API_URL`: backend base URL including `/api`
//! - `RCM_API_TIMEOUT_SECS`: per-request timeout
//! - `RCM_POLL_INTERVAL_MS`: delay between job status fetches
//! - `RCM_POLL_TIMEOUT_SECS`: wall-clock budget for tracking one job
//! - `RCM_SESSION_BACKEND`: `file` or `keychain`
//! - `RCM_SESSION_PATH`: session file location
//! - `RCM_LOG_LEVEL`: default log filter
//! - `RCM_LOG_JSON`: JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./rcm.toml`, `./rcm.json`, `./config.toml`, `./config.json`
//! 2. The same names one and two directories up
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rcm_domain::{ClientConfig, RcmError, Result, SessionBackend};

use crate::errors::InfraError;

/// Names of the override variables listed above
pub const ENV_API_URL: &str = "RCM_API_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "RCM_API_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_MS: &str = "RCM_POLL_INTERVAL_MS";
pub const ENV_POLL_TIMEOUT_SECS: &str = "RCM_POLL_TIMEOUT_SECS";
pub const ENV_SESSION_BACKEND: &str = "RCM_SESSION_BACKEND";
pub const ENV_SESSION_PATH: &str = "RCM_SESSION_PATH";
pub const ENV_LOG_LEVEL: &str = "RCM_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "RCM_LOG_JSON";

const CONFIG_FILE_NAMES: [&str; 4] = ["rcm.toml", "rcm.json", "config.toml", "config.json"];

/// Load configuration from the first config file found (or defaults), then
/// apply environment overrides
///
/// # Errors
/// Returns `RcmError::Config` if a found file cannot be parsed or an
/// environment override has an invalid value.
pub fn load() -> Result<ClientConfig> {
    let config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            ClientConfig::default()
        }
    };
    apply_env_overrides(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `RcmError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RcmError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RcmError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RcmError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, detecting the format by extension
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RcmError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(RcmError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

/// Apply `RCM_*` environment overrides
///
/// # Errors
/// Returns `RcmError::Config` naming the variable when a value is invalid.
pub fn apply_env_overrides(mut config: ClientConfig) -> Result<ClientConfig> {
    if let Some(url) = env_string(ENV_API_URL) {
        url::Url::parse(&url)
            .map_err(|e| RcmError::Config(format!("Invalid {ENV_API_URL} {url:?}: {e}")))?;
        config.api.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(timeout) = env_parse::<u64>(ENV_API_TIMEOUT_SECS)? {
        config.api.timeout_secs = timeout;
    }
    if let Some(interval) = env_parse::<u64>(ENV_POLL_INTERVAL_MS)? {
        if interval == 0 {
            return Err(RcmError::Config(format!("{ENV_POLL_INTERVAL_MS} must be positive")));
        }
        config.polling.interval_ms = interval;
    }
    if let Some(timeout) = env_parse::<u64>(ENV_POLL_TIMEOUT_SECS)? {
        config.polling.timeout_secs = timeout;
    }
    if let Some(backend) = env_string(ENV_SESSION_BACKEND) {
        config.session.backend = SessionBackend::from_str(&backend).map_err(RcmError::Config)?;
    }
    if let Some(path) = env_string(ENV_SESSION_PATH) {
        config.session.path = Some(PathBuf::from(path));
    }
    if let Some(level) = env_string(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(json) = env_bool(ENV_LOG_JSON)? {
        config.logging.json = json;
    }
    Ok(config)
}

/// Non-empty environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| RcmError::Config(format!("Invalid {key} {raw:?}: {e}")))
        })
        .transpose()
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str) -> Result<Option<bool>> {
    let Some(raw) = env_string(key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(RcmError::Config(format!("Invalid {key} {raw:?}: expected a boolean"))),
    }
}
