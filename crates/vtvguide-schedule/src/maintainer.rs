//! Keeps persisted channel schedules fresh.
#![allow(clippy::future_not_send)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::instrument;
use vtvguide_api::library::{CatalogItem, LocalCatalogApi, LocalIdentityApi};
use vtvguide_store::{ChannelSchedule, RecordStore};

use crate::builder::{build_schedule, extend_schedule, fetch_channel_items};
use crate::clock::Clock;
use crate::tuner::VirtualTuner;

impl<L, R, K> VirtualTuner<L, R, K>
where
    L: LocalCatalogApi + LocalIdentityApi + Sync,
    R: RecordStore,
    K: Clock,
{
    /// Returns the channel schedule, building or refreshing it when needed.
    ///
    /// - No saved schedule: build one; save it only if it has entries.
    /// - Saved and younger than the staleness threshold: return it as is.
    /// - Saved but stale: drop elapsed entries, append new ones, save.
    ///
    /// Channel IDs are matched case-insensitively. Persistence failures are
    /// logged and never fail the call.
    ///
    /// # Errors
    ///
    /// Returns an error if a build or refresh was needed and the catalog
    /// query failed.
    #[instrument(skip_all, fields(tuner_id = %self.config.id, channel_id = %channel_id))]
    pub async fn ensure_fresh(&self, channel_id: &str) -> Result<ChannelSchedule> {
        let channel_id = channel_id.to_ascii_lowercase();
        let checked_at = self.clock.now();
        if let Some(schedule) = self
            .load_saved(&channel_id)
            .filter(|schedule| self.is_fresh(schedule, checked_at))
        {
            tracing::debug!(
                programs = schedule.programs.len(),
                "Using cached channel schedule"
            );
            return Ok(schedule);
        }

        let items =
            fetch_channel_items(&self.library, self.config.user_id.as_deref(), &channel_id)
                .await?;

        let key = format!("{}/{channel_id}", self.config.id);
        let guard = self.locks.lock(&key).await;
        let schedule = self.refresh_locked(&channel_id, items.as_deref());
        drop(guard);
        self.locks.release(&key);
        Ok(schedule)
    }

    /// Re-checks, then refreshes or builds the schedule. Call with the
    /// channel lock held.
    fn refresh_locked(&self, channel_id: &str, items: Option<&[CatalogItem]>) -> ChannelSchedule {
        let now = self.clock.now();
        match self.load_saved(channel_id) {
            Some(schedule) if self.is_fresh(&schedule, now) => {
                tracing::debug!("Channel schedule refreshed by a concurrent caller");
                schedule
            }
            Some(mut schedule) => {
                let trimmed = schedule.remove_elapsed(now);
                let appended = extend_schedule(&mut schedule, items, now, self.horizon);
                schedule.last_updated = now;
                tracing::info!(
                    trimmed,
                    appended,
                    programs = schedule.programs.len(),
                    "Refreshed channel schedule"
                );
                self.persist(channel_id, &schedule);
                schedule
            }
            None => {
                let schedule = build_schedule(items, now, self.horizon);
                if schedule.programs.is_empty() {
                    tracing::debug!("Built empty channel schedule, not saving");
                } else {
                    tracing::info!(
                        programs = schedule.programs.len(),
                        "Built channel schedule"
                    );
                    self.persist(channel_id, &schedule);
                }
                schedule
            }
        }
    }

    fn is_fresh(&self, schedule: &ChannelSchedule, now: DateTime<Utc>) -> bool {
        schedule.age(now) < self.stale_after
    }
}

impl<L, R: RecordStore, K> VirtualTuner<L, R, K> {
    /// Loads the saved schedule, treating unreadable records as absent.
    pub(crate) fn load_saved(&self, channel_id: &str) -> Option<ChannelSchedule> {
        match self.store.load(&self.config.id, channel_id) {
            Ok(schedule) => schedule,
            Err(e) => {
                tracing::warn!(
                    channel_id,
                    error = %format!("{e:#}"),
                    "Failed to load channel schedule, rebuilding"
                );
                None
            }
        }
    }

    /// Saves the schedule; failures are logged and dropped.
    pub(crate) fn persist(&self, channel_id: &str, schedule: &ChannelSchedule) {
        if let Err(e) = self.store.save(&self.config.id, channel_id, schedule) {
            tracing::warn!(
                channel_id,
                error = %format!("{e:#}"),
                "Failed to save channel schedule"
            );
        }
    }
}
