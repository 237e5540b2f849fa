//! `AppConfig` struct and TOML loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use serde::Deserialize;
use vtvguide_schedule::options::{DEFAULT_HORIZON_DAYS, DEFAULT_STALE_AFTER_HOURS};
use vtvguide_schedule::{GuideOptions, TunerConfig};

/// Environment variable that overrides `server.api_key`.
pub const API_KEY_ENV: &str = "VTVGUIDE_API_KEY";

/// Default library server URL.
const DEFAULT_SERVER_URL: &str = "http://localhost:8096/emby/";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Library server connection.
    #[serde(default)]
    pub server: ServerConfig,
    /// Schedule generation settings.
    #[serde(default)]
    pub guide: GuideConfig,
    /// Configured virtual tuners.
    #[serde(default)]
    pub tuners: Vec<TunerEntry>,
}

/// Library server connection settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Base URL of the library API.
    #[serde(default = "default_server_url")]
    pub url: String,
    /// API key (overridden by `VTVGUIDE_API_KEY`).
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_server_url() -> String {
    String::from(DEFAULT_SERVER_URL)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            api_key: None,
        }
    }
}

/// Schedule generation settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct GuideConfig {
    /// Days of programming laid out ahead.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    /// Hours after which a saved schedule is refreshed.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u32,
    /// Schedule cache root (default: `--dir` or `~/.cache/vtvguide`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

const fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

const fn default_stale_after_hours() -> u32 {
    DEFAULT_STALE_AFTER_HOURS
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            stale_after_hours: DEFAULT_STALE_AFTER_HOURS,
            cache_dir: None,
        }
    }
}

/// One configured tuner.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct TunerEntry {
    /// Tuner ID.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// User whose favorites feed the channels.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TunerEntry {
    /// Converts to the scheduler's tuner identity.
    #[must_use]
    pub fn to_tuner_config(&self) -> TunerConfig {
        TunerConfig {
            id: self.id.clone(),
            friendly_name: self.friendly_name.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Finds a configured tuner by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if no tuner has the given ID.
    pub fn tuner(&self, id: &str) -> Result<&TunerEntry> {
        let Some(tuner) = self.tuners.iter().find(|t| t.id == id) else {
            let known: Vec<&str> = self.tuners.iter().map(|t| t.id.as_str()).collect();
            bail!("unknown tuner: {id} (configured: [{}])", known.join(", "));
        };
        Ok(tuner)
    }

    /// Picks the API key, preferring the environment value.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source provides a non-empty key.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|key| !key.is_empty())
            .or_else(|| self.server.api_key.clone().filter(|key| !key.is_empty()))
            .with_context(|| {
                format!("library API key is required: set server.api_key or {API_KEY_ENV}")
            })
    }

    /// Builds guide options rooted at `cache_dir`.
    #[must_use]
    pub fn guide_options(&self, cache_dir: PathBuf) -> GuideOptions {
        let mut options = GuideOptions::new(cache_dir);
        options.horizon_days = self.guide.horizon_days;
        options.stale_after = TimeDelta::hours(i64::from(self.guide.stale_after_hours));
        options
    }
}
