//! Channel schedule data model.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// One placed catalog item on a channel timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Catalog item ID (reference only; catalog data is not copied).
    pub item_id: String,
    /// Air start (inclusive).
    pub start: DateTime<Utc>,
    /// Air end (exclusive), `start + runtime`.
    pub end: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(item_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            start,
            end,
        }
    }

    /// Returns `true` once the entry has finished airing.
    #[must_use]
    pub fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }

    /// Returns `true` if the entry airs at `at` (`start <= at < end`).
    #[must_use]
    pub fn is_airing_at(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Returns `true` if the entry overlaps the half-open window `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> bool {
        self.end > window_start && self.start < window_end
    }
}

/// Persisted timeline of one (tuner, channel).
///
/// `programs` is ordered by `start` and never overlaps:
/// `programs[i].end <= programs[i + 1].start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSchedule {
    /// Time of the last build or refresh.
    pub last_updated: DateTime<Utc>,
    /// Scheduled entries.
    #[serde(default)]
    pub programs: Vec<ScheduleEntry>,
}

impl ChannelSchedule {
    /// Creates an empty schedule stamped with `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            programs: Vec::new(),
        }
    }

    /// Time since the last refresh.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.last_updated)
    }

    /// Removes the leading run of elapsed entries. Returns the number removed.
    ///
    /// Stops at the first entry still airing or upcoming.
    pub fn remove_elapsed(&mut self, now: DateTime<Utc>) -> usize {
        let count = self
            .programs
            .iter()
            .take_while(|entry| entry.is_elapsed(now))
            .count();
        if count > 0 {
            self.programs.drain(..count);
        }
        count
    }

    /// End of the last entry, if any.
    #[must_use]
    pub fn tail_end(&self) -> Option<DateTime<Utc>> {
        self.programs.last().map(|entry| entry.end)
    }

    /// Entry airing at `at`, if any.
    #[must_use]
    pub fn airing_at(&self, at: DateTime<Utc>) -> Option<&ScheduleEntry> {
        self.programs
            .iter()
            .take_while(|entry| entry.start <= at)
            .find(|entry| entry.is_airing_at(at))
    }

    /// IDs of all scheduled items.
    #[must_use]
    pub fn item_ids(&self) -> HashSet<&str> {
        self.programs
            .iter()
            .map(|entry| entry.item_id.as_str())
            .collect()
    }

    /// Returns `true` if entries are ordered and non-overlapping.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.programs
            .windows(2)
            .all(|pair| matches!(pair, [a, b] if a.end <= b.start))
    }
}
