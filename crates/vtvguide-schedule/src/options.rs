//! Tuner identity and guide generation options.

use std::path::PathBuf;

use chrono::TimeDelta;

/// Default guide horizon in days.
pub const DEFAULT_HORIZON_DAYS: u32 = 14;

/// Default staleness threshold in hours.
pub const DEFAULT_STALE_AFTER_HOURS: u32 = 6;

/// Identity of one configured virtual tuner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunerConfig {
    /// Tuner ID (also the record directory name).
    pub id: String,
    /// Display name (nullable).
    pub friendly_name: Option<String>,
    /// User whose favorites feed the channels (nullable).
    pub user_id: Option<String>,
}

impl TunerConfig {
    /// Creates a tuner config without a display name or user.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            friendly_name: None,
            user_id: None,
        }
    }

    /// Sets the user whose favorites feed the channels.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Display name, falling back to the tuner ID.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.id)
    }
}

/// Schedule generation and caching options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideOptions {
    /// How far ahead schedules are laid out, in days.
    pub horizon_days: u32,
    /// Age after which a saved schedule is refreshed.
    pub stale_after: TimeDelta,
    /// Root directory of persisted schedules.
    pub cache_dir: PathBuf,
}

impl GuideOptions {
    /// Creates options with the default horizon and staleness threshold.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            stale_after: TimeDelta::hours(i64::from(DEFAULT_STALE_AFTER_HOURS)),
            cache_dir: cache_dir.into(),
        }
    }

    /// Horizon as a duration.
    #[must_use]
    pub fn horizon(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.horizon_days))
    }
}
