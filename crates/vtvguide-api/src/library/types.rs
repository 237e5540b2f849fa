//! Library API data types.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use url::Url;

/// Nanoseconds per runtime tick.
const NANOS_PER_TICK: i64 = 100;

/// Catalog item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Feature film.
    Movie,
    /// Episode of a series.
    Episode,
    /// Music track.
    Audio,
    /// Anything else (folders, series, albums, ...).
    Other,
}

impl ItemKind {
    /// Returns the server-side type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Episode => "Episode",
            Self::Audio => "Audio",
            Self::Other => "Other",
        }
    }

    /// Parses a server-side type name. Unknown names map to `Other`.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Movie" => Self::Movie,
            "Episode" => Self::Episode,
            "Audio" => Self::Audio,
            _ => Self::Other,
        }
    }
}

/// Artwork URLs of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemImages {
    /// Primary (poster / cover) image.
    pub primary: Option<String>,
    /// Logo image.
    pub logo: Option<String>,
    /// Backdrop (fan art) image.
    pub backdrop: Option<String>,
}

impl ItemImages {
    /// Fills every empty slot from `other`, keeping slots already set.
    pub fn fill_missing(&mut self, other: &Self) {
        if self.primary.is_none() {
            self.primary.clone_from(&other.primary);
        }
        if self.logo.is_none() {
            self.logo.clone_from(&other.logo);
        }
        if self.backdrop.is_none() {
            self.backdrop.clone_from(&other.backdrop);
        }
    }
}

/// A catalog item (movie, episode, track, series, album, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Item ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Item type.
    pub kind: ItemKind,
    /// Runtime in 100-ns ticks (nullable).
    pub runtime_ticks: Option<i64>,
    /// Synopsis (nullable).
    pub overview: Option<String>,
    /// Episode / track number (nullable).
    pub index_number: Option<i32>,
    /// Season / disc number (nullable).
    pub parent_index_number: Option<i32>,
    /// External provider IDs (`Imdb`, `Tmdb`, ...).
    pub provider_ids: BTreeMap<String, String>,
    /// Owning series ID for episodes (nullable).
    pub series_id: Option<String>,
    /// Owning album ID for tracks (nullable).
    pub album_id: Option<String>,
    /// Video width (nullable).
    pub width: Option<u32>,
    /// Video height (nullable).
    pub height: Option<u32>,
    /// Whether the video is stereoscopic.
    pub is_3d: bool,
    /// Parental rating (nullable).
    pub official_rating: Option<String>,
    /// Community rating (nullable).
    pub community_rating: Option<f32>,
    /// Genre names.
    pub genres: Vec<String>,
    /// Original release / air date (nullable).
    pub premiere_date: Option<DateTime<Utc>>,
    /// Production year (nullable).
    pub production_year: Option<i32>,
    /// Artwork URLs.
    pub images: ItemImages,
}

impl CatalogItem {
    /// Creates an item with only the identifying fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            runtime_ticks: None,
            overview: None,
            index_number: None,
            parent_index_number: None,
            provider_ids: BTreeMap::new(),
            series_id: None,
            album_id: None,
            width: None,
            height: None,
            is_3d: false,
            official_rating: None,
            community_rating: None,
            genres: Vec::new(),
            premiere_date: None,
            production_year: None,
            images: ItemImages::default(),
        }
    }

    /// Sets the runtime from a duration.
    #[must_use]
    pub fn with_runtime(mut self, runtime: TimeDelta) -> Self {
        self.runtime_ticks = runtime
            .num_nanoseconds()
            .and_then(|ns| ns.checked_div(NANOS_PER_TICK));
        self
    }

    /// Returns the runtime if it is known and positive.
    ///
    /// Items without a usable runtime cannot be placed on a timeline.
    #[must_use]
    pub fn runtime(&self) -> Option<TimeDelta> {
        let ns = self.runtime_ticks?.checked_mul(NANOS_PER_TICK)?;
        (ns > 0).then(|| TimeDelta::nanoseconds(ns))
    }
}

/// A library user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    /// User ID.
    pub id: String,
    /// User name.
    #[serde(default)]
    pub name: String,
}

/// A playable media source of an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSource {
    /// Media source ID.
    pub id: String,
    /// Display name (nullable).
    #[serde(default)]
    pub name: Option<String>,
    /// File path or stream URL (nullable).
    #[serde(default)]
    pub path: Option<String>,
    /// Access protocol (`File`, `Http`, ...) (nullable).
    #[serde(default)]
    pub protocol: Option<String>,
    /// Container format (nullable).
    #[serde(default)]
    pub container: Option<String>,
    /// Whether the client may play the source directly.
    #[serde(default)]
    pub supports_direct_play: bool,
}

/// `Items` list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ItemsResponse {
    /// Returned items.
    #[serde(default)]
    pub items: Vec<ItemDto>,
}

/// `PlaybackInfo` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PlaybackInfoResponse {
    /// Playable sources.
    #[serde(default)]
    pub media_sources: Vec<MediaSource>,
}

/// Item as returned on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ItemDto {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub run_time_ticks: Option<i64>,
    pub overview: Option<String>,
    pub index_number: Option<i32>,
    pub parent_index_number: Option<i32>,
    pub provider_ids: Option<BTreeMap<String, String>>,
    pub series_id: Option<String>,
    pub album_id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(rename = "Video3DFormat")]
    pub video_3d_format: Option<String>,
    pub official_rating: Option<String>,
    pub community_rating: Option<f32>,
    pub genres: Option<Vec<String>>,
    pub premiere_date: Option<DateTime<Utc>>,
    pub production_year: Option<i32>,
    pub image_tags: Option<BTreeMap<String, String>>,
    pub backdrop_image_tags: Option<Vec<String>>,
}

impl ItemDto {
    /// Converts the wire item into a `CatalogItem`, resolving artwork URLs
    /// against the server base URL.
    pub(crate) fn into_item(self, base_url: &Url) -> CatalogItem {
        let tags = self.image_tags.unwrap_or_default();
        let images = ItemImages {
            primary: tags
                .get("Primary")
                .and_then(|tag| image_url(base_url, &self.id, "Primary", tag)),
            logo: tags
                .get("Logo")
                .and_then(|tag| image_url(base_url, &self.id, "Logo", tag)),
            backdrop: self
                .backdrop_image_tags
                .as_deref()
                .and_then(<[String]>::first)
                .and_then(|tag| image_url(base_url, &self.id, "Backdrop", tag)),
        };

        CatalogItem {
            name: self.name.unwrap_or_default(),
            kind: self
                .item_type
                .as_deref()
                .map_or(ItemKind::Other, ItemKind::from_type_name),
            runtime_ticks: self.run_time_ticks,
            overview: self.overview,
            index_number: self.index_number,
            parent_index_number: self.parent_index_number,
            provider_ids: self.provider_ids.unwrap_or_default(),
            series_id: self.series_id,
            album_id: self.album_id,
            width: self.width,
            height: self.height,
            is_3d: self.video_3d_format.is_some(),
            official_rating: self.official_rating,
            community_rating: self.community_rating,
            genres: self.genres.unwrap_or_default(),
            premiere_date: self.premiere_date,
            production_year: self.production_year,
            images,
            id: self.id,
        }
    }
}

/// Builds `{base}/Items/{id}/Images/{kind}?tag={tag}`.
fn image_url(base_url: &Url, item_id: &str, kind: &str, tag: &str) -> Option<String> {
    let mut url = base_url
        .join(&format!("Items/{item_id}/Images/{kind}"))
        .ok()?;
    url.query_pairs_mut().append_pair("tag", tag);
    Some(url.to_string())
}
