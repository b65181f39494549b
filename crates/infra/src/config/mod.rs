//! Configuration loading
//!
//! Config files and `RCM_*` environment variables, layered over the defaults
//! in `rcm_domain::config`.

pub mod loader;

pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
