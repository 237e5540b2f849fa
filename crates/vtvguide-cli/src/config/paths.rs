//! Config file and cache directory resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .map(PathBuf::from)
        .context("HOME environment variable is not set")
}

/// Resolves the config file path.
///
/// - If `dir` is `Some`, returns `{dir}/config.toml`.
/// - Otherwise returns `~/.config/vtvguide/config.toml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join("config.toml"));
    }
    Ok(home_dir()?.join(".config").join("vtvguide").join("config.toml"))
}

/// Resolves the schedule cache root.
///
/// Precedence: `cache_dir` from the config file, then `dir`, then
/// `~/.cache/vtvguide`.
///
/// # Errors
///
/// Returns an error if the home directory is needed but cannot be determined.
pub fn resolve_cache_dir(configured: Option<&Path>, dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    if let Some(d) = dir {
        return Ok(d.clone());
    }
    Ok(home_dir()?.join(".cache").join("vtvguide"))
}
