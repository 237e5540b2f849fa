//! Library service trait definitions.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::query::CatalogQuery;
use super::types::{CatalogItem, MediaSource, User};

/// Catalog lookup service.
///
/// Abstracts catalog operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CatalogApi: Send)]
pub trait LocalCatalogApi {
    /// Finds items matching the query, in the catalog's natural order.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn find_items(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>>;

    /// Looks up a single item by ID. Returns `None` if the item no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn get_item(&self, item_id: &str) -> Result<Option<CatalogItem>>;
}

/// User identity service.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(IdentityApi: Send)]
pub trait LocalIdentityApi {
    /// Looks up a user by ID. Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;
}

/// Playback media-source resolution service.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(MediaSourceApi: Send)]
pub trait LocalMediaSourceApi {
    /// Resolves the playable media sources of a catalog item.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn playback_sources(&self, item_id: &str) -> Result<Vec<MediaSource>>;
}
