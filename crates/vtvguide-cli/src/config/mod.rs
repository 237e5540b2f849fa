//! Application configuration module.
//!
//! Manages the TOML config file holding the library server connection,
//! guide options, and the configured tuners.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{API_KEY_ENV, AppConfig};
pub use paths::{resolve_cache_dir, resolve_config_path};
