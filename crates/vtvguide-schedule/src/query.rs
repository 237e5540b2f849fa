//! Guide program queries and playback resolution.
#![allow(clippy::future_not_send)]

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use vtvguide_api::library::{
    CatalogItem, ItemImages, ItemKind, LocalCatalogApi, LocalIdentityApi, LocalMediaSourceApi,
    MediaSource,
};
use vtvguide_store::{RecordStore, ScheduleEntry};

use crate::clock::Clock;
use crate::error::GuideError;
use crate::tuner::VirtualTuner;

/// Provider ID key carrying the catalog item ID of a program.
pub const DB_ID_PROVIDER: &str = "DbId";

/// A guide program: a schedule entry joined with live catalog metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideProgram {
    /// Stable program ID (see [`program_entry_id`]).
    pub id: String,
    /// Channel the program airs on.
    pub channel_id: String,
    /// Catalog item ID.
    pub show_id: String,
    /// Title (series name for episodes).
    pub name: String,
    /// Episode title (episodes only).
    pub episode_title: Option<String>,
    /// Synopsis.
    pub overview: Option<String>,
    /// Episode number.
    pub episode_number: Option<i32>,
    /// Season number.
    pub season_number: Option<i32>,
    /// External provider IDs, always including [`DB_ID_PROVIDER`].
    pub provider_ids: BTreeMap<String, String>,
    /// Series ID (episodes only).
    pub series_id: Option<String>,
    /// Series provider IDs (episodes only).
    pub series_provider_ids: BTreeMap<String, String>,
    /// Video width.
    pub width: Option<u32>,
    /// Video height.
    pub height: Option<u32>,
    /// Whether the item is a movie.
    pub is_movie: bool,
    /// Whether the item is an episode.
    pub is_series: bool,
    /// Whether the video is stereoscopic.
    pub is_3d: bool,
    /// Parental rating.
    pub official_rating: Option<String>,
    /// Community rating.
    pub community_rating: Option<f32>,
    /// Genre names.
    pub genres: Vec<String>,
    /// Original release / air date.
    pub original_air_date: Option<DateTime<Utc>>,
    /// Production year.
    pub production_year: Option<i32>,
    /// Primary image URL.
    pub image_url: Option<String>,
    /// Logo image URL.
    pub logo_image_url: Option<String>,
    /// Backdrop image URL.
    pub backdrop_image_url: Option<String>,
    /// Air start.
    pub start: DateTime<Utc>,
    /// Air end.
    pub end: DateTime<Utc>,
}

/// Builds the program ID for an airing of `show_id` on `channel_id`.
///
/// The same airing always yields the same ID so hosts can match programs
/// across guide refreshes.
#[must_use]
pub fn program_entry_id(show_id: &str, start: DateTime<Utc>, channel_id: &str) -> String {
    format!("{channel_id}_{show_id}_{}", start.format("%Y%m%d%H%M%S"))
}

/// Looks up an item, logging and dropping lookup failures.
async fn lookup_item(
    library: &(impl LocalCatalogApi + Sync),
    item_id: &str,
) -> Option<CatalogItem> {
    match library.get_item(item_id).await {
        Ok(Some(item)) => Some(item),
        Ok(None) => {
            tracing::debug!(item_id, "Scheduled item no longer in catalog");
            None
        }
        Err(e) => {
            tracing::warn!(item_id, error = %format!("{e:#}"), "Failed to look up scheduled item");
            None
        }
    }
}

/// Joins a schedule entry with its catalog item.
async fn to_guide_program(
    library: &(impl LocalCatalogApi + Sync),
    item: CatalogItem,
    entry: &ScheduleEntry,
    channel_id: &str,
) -> GuideProgram {
    let mut provider_ids = item.provider_ids;
    provider_ids.insert(String::from(DB_ID_PROVIDER), item.id.clone());

    let mut name = item.name;
    let mut episode_title = None;
    let mut series_provider_ids = BTreeMap::new();
    let mut images = ItemImages::default();

    if item.kind == ItemKind::Episode {
        let series = match item.series_id.as_deref() {
            Some(series_id) => lookup_item(library, series_id).await,
            None => None,
        };
        if let Some(series) = series {
            episode_title = Some(std::mem::replace(&mut name, series.name));
            series_provider_ids = series.provider_ids;
            images = series.images;
        } else {
            episode_title = Some(name.clone());
        }
    }
    images.fill_missing(&item.images);

    let album = match (item.kind, item.album_id.as_deref()) {
        (ItemKind::Audio, Some(album_id)) => lookup_item(library, album_id).await,
        _ => None,
    };
    if let Some(album) = album {
        images.fill_missing(&album.images);
    }

    GuideProgram {
        id: program_entry_id(&item.id, entry.start, channel_id),
        channel_id: String::from(channel_id),
        show_id: item.id,
        name,
        episode_title,
        overview: item.overview,
        episode_number: item.index_number,
        season_number: item.parent_index_number,
        provider_ids,
        series_id: item.series_id,
        series_provider_ids,
        width: item.width,
        height: item.height,
        is_movie: item.kind == ItemKind::Movie,
        is_series: item.kind == ItemKind::Episode,
        is_3d: item.is_3d,
        official_rating: item.official_rating,
        community_rating: item.community_rating,
        genres: item.genres,
        original_air_date: item.premiere_date,
        production_year: item.production_year,
        image_url: images.primary,
        logo_image_url: images.logo,
        backdrop_image_url: images.backdrop,
        start: entry.start,
        end: entry.end,
    }
}

/// Programs overlapping `[window_start, window_end)`, in air order.
///
/// Entries whose item is gone, failed to load, or lost its runtime are
/// left out, leaving a gap in the guide.
pub(crate) async fn query_programs<L, R, K>(
    tuner: &VirtualTuner<L, R, K>,
    channel_id: &str,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<GuideProgram>>
where
    L: LocalCatalogApi + LocalIdentityApi + Sync,
    R: RecordStore,
    K: Clock,
{
    let schedule = tuner.ensure_fresh(channel_id).await?;
    let mut programs = Vec::new();

    for entry in &schedule.programs {
        if entry.end <= window_start {
            continue;
        }
        if entry.start >= window_end {
            break;
        }
        let Some(item) = lookup_item(&tuner.library, &entry.item_id).await else {
            continue;
        };
        if item.runtime().is_none() {
            tracing::debug!(item_id = %entry.item_id, "Scheduled item lost its runtime");
            continue;
        }
        programs.push(to_guide_program(&tuner.library, item, entry, channel_id).await);
    }

    tracing::debug!(
        programs = programs.len(),
        %window_start,
        %window_end,
        "Resolved guide programs"
    );
    Ok(programs)
}

/// Playback sources of the program airing now.
///
/// Returns an empty list when the airing item was removed from the catalog.
pub(crate) async fn resolve_playback_source<L, R, K>(
    tuner: &VirtualTuner<L, R, K>,
    channel_id: &str,
) -> Result<Vec<MediaSource>>
where
    L: LocalCatalogApi + LocalIdentityApi + LocalMediaSourceApi + Sync,
    R: RecordStore,
    K: Clock,
{
    let schedule = tuner.ensure_fresh(channel_id).await?;
    let now = tuner.clock.now();
    let entry = schedule
        .airing_at(now)
        .ok_or_else(|| GuideError::NoProgramAiring {
            channel_id: String::from(channel_id),
        })?;

    let Some(item) = tuner
        .library
        .get_item(&entry.item_id)
        .await
        .with_context(|| format!("failed to look up item {}", entry.item_id))?
    else {
        tracing::info!(item_id = %entry.item_id, "Airing item no longer in catalog");
        return Ok(Vec::new());
    };

    let sources = tuner
        .library
        .playback_sources(&item.id)
        .await
        .with_context(|| format!("failed to resolve playback sources for {}", item.id))?;
    tracing::info!(
        item_id = %item.id,
        sources = sources.len(),
        "Resolved playback sources"
    );
    Ok(sources)
}
