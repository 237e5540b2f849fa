//! Virtual tuner and its host-facing capability trait.
#![allow(clippy::future_not_send)]

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::instrument;
use vtvguide_api::library::{LocalCatalogApi, LocalIdentityApi, LocalMediaSourceApi, MediaSource};
pub use vtvguide_store::TUNER_TYPE;
use vtvguide_store::{RecordStore, ScheduleStore};

use crate::channels::{ChannelInfo, channel_lineup};
use crate::clock::{Clock, SystemClock};
use crate::locks::KeyedLocks;
use crate::options::{GuideOptions, TunerConfig};
use crate::query::{self, GuideProgram};

/// Operations a live-TV host invokes on a tuner.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TunerHost: Send)]
pub trait LocalTunerHost {
    /// Display name.
    fn name(&self) -> &str;

    /// Registration key of the tuner implementation.
    fn tuner_type(&self) -> &'static str;

    /// Channels offered by this tuner.
    fn list_channels(&self) -> Vec<ChannelInfo>;

    /// Programs on `channel_id` overlapping `[window_start, window_end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule had to be built or refreshed and the
    /// catalog query failed.
    async fn query_programs(
        &self,
        channel_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<GuideProgram>>;

    /// Playback sources of the program airing now on `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GuideError::NoProgramAiring`] if nothing is airing,
    /// or an error if a collaborator fails.
    async fn resolve_playback_source(&self, channel_id: &str) -> Result<Vec<MediaSource>>;

    /// Called after the tuner's configuration was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if cached schedules cannot be removed.
    fn on_configuration_changed(&self) -> Result<()>;

    /// Called after the tuner was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if cached schedules cannot be removed.
    fn on_removed(&self) -> Result<()>;
}

/// Tuner presenting a user's favorites as broadcast channels.
///
/// Generic over the library client `L`, the record store `R`, and the
/// clock `K`.
#[derive(Debug)]
pub struct VirtualTuner<L, R, K = SystemClock> {
    pub(crate) config: TunerConfig,
    pub(crate) horizon: TimeDelta,
    pub(crate) stale_after: TimeDelta,
    pub(crate) library: L,
    pub(crate) store: ScheduleStore<R>,
    pub(crate) clock: K,
    pub(crate) locks: KeyedLocks,
}

impl<L, R: RecordStore> VirtualTuner<L, R> {
    /// Creates a tuner using the system clock.
    pub fn new(config: TunerConfig, options: &GuideOptions, library: L, records: R) -> Self {
        Self {
            config,
            horizon: options.horizon(),
            stale_after: options.stale_after,
            library,
            store: ScheduleStore::new(records, options.cache_dir.clone()),
            clock: SystemClock,
            locks: KeyedLocks::new(),
        }
    }
}

impl<L, R, K> VirtualTuner<L, R, K> {
    /// Replaces the clock.
    pub fn with_clock<C: Clock>(self, clock: C) -> VirtualTuner<L, R, C> {
        VirtualTuner {
            config: self.config,
            horizon: self.horizon,
            stale_after: self.stale_after,
            library: self.library,
            store: self.store,
            clock,
            locks: self.locks,
        }
    }

    /// Tuner configuration.
    pub const fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Library client.
    pub const fn library(&self) -> &L {
        &self.library
    }

    /// Schedule store.
    pub const fn store(&self) -> &ScheduleStore<R> {
        &self.store
    }
}

impl<L, R: RecordStore, K> VirtualTuner<L, R, K> {
    /// Deletes every cached schedule of this tuner. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if the record directory cannot be removed.
    pub fn reset(&self) -> Result<()> {
        self.store.reset(&self.config.id)
    }
}

impl<L, R, K> LocalTunerHost for VirtualTuner<L, R, K>
where
    L: LocalCatalogApi + LocalIdentityApi + LocalMediaSourceApi + Sync,
    R: RecordStore,
    K: Clock,
{
    fn name(&self) -> &str {
        self.config.display_name()
    }

    fn tuner_type(&self) -> &'static str {
        TUNER_TYPE
    }

    fn list_channels(&self) -> Vec<ChannelInfo> {
        channel_lineup(&self.config.id)
    }

    #[instrument(skip_all, fields(tuner_id = %self.config.id, channel_id = %channel_id))]
    async fn query_programs(
        &self,
        channel_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<GuideProgram>> {
        query::query_programs(self, channel_id, window_start, window_end).await
    }

    #[instrument(skip_all, fields(tuner_id = %self.config.id, channel_id = %channel_id))]
    async fn resolve_playback_source(&self, channel_id: &str) -> Result<Vec<MediaSource>> {
        query::resolve_playback_source(self, channel_id).await
    }

    fn on_configuration_changed(&self) -> Result<()> {
        tracing::info!(tuner_id = %self.config.id, "Tuner configuration changed");
        self.reset()
    }

    fn on_removed(&self) -> Result<()> {
        tracing::info!(tuner_id = %self.config.id, "Tuner removed");
        self.reset()
    }
}
