//! Static channel lineup and channel-to-catalog filters.

use vtvguide_api::library::{CatalogQuery, ItemKind};

/// Channel showing the user's favorite movies.
pub const FAVORITE_MOVIES: &str = "favoritemovies";
/// Channel showing the user's favorite episodes.
pub const FAVORITE_SHOWS: &str = "favoriteshows";
/// Radio channel playing the user's favorite songs.
pub const FAVORITE_SONGS: &str = "favoritesongs";

/// Channel medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Video channel.
    Tv,
    /// Audio-only channel.
    Radio,
}

impl ChannelKind {
    /// Returns a display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tv => "TV",
            Self::Radio => "Radio",
        }
    }
}

/// A channel offered by a tuner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning tuner ID.
    pub tuner_id: String,
    /// Medium.
    pub kind: ChannelKind,
}

/// Returns the fixed channel lineup of a tuner.
#[must_use]
pub fn channel_lineup(tuner_id: &str) -> Vec<ChannelInfo> {
    [
        (FAVORITE_MOVIES, "Favorite Movies", ChannelKind::Tv),
        (FAVORITE_SHOWS, "Favorite Shows", ChannelKind::Tv),
        (FAVORITE_SONGS, "Favorite Songs", ChannelKind::Radio),
    ]
    .into_iter()
    .map(|(id, name, kind)| ChannelInfo {
        id: String::from(id),
        name: String::from(name),
        tuner_id: String::from(tuner_id),
        kind,
    })
    .collect()
}

/// Maps a channel ID to the catalog filter feeding it.
///
/// IDs are matched case-insensitively. Unknown IDs get an unfiltered
/// favorites query.
#[must_use]
pub fn resolve_query(channel_id: &str, user_id: &str) -> CatalogQuery {
    let query = CatalogQuery::favorites(user_id);
    if channel_id.eq_ignore_ascii_case(FAVORITE_MOVIES) {
        query.with_item_types(&[ItemKind::Movie])
    } else if channel_id.eq_ignore_ascii_case(FAVORITE_SHOWS) {
        query.with_item_types(&[ItemKind::Episode])
    } else if channel_id.eq_ignore_ascii_case(FAVORITE_SONGS) {
        query.with_item_types(&[ItemKind::Audio])
    } else {
        query
    }
}
