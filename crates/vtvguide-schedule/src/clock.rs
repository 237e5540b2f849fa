//! Time source abstraction.

use chrono::{DateTime, Timelike, Utc};

/// Source of the current time.
///
/// Injected into the tuner so schedule decisions can be tested against a
/// fixed or manually advanced clock.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Truncates a timestamp to the start of its hour.
#[must_use]
pub fn round_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}
