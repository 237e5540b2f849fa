//! Media library API client module.
//!
//! Handles HTTP requests to an Emby-compatible library server and
//! retrieves catalog items, users, and playback media sources.

mod api;
mod client;
mod query;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{
    CatalogApi, IdentityApi, LocalCatalogApi, LocalIdentityApi, LocalMediaSourceApi,
    MediaSourceApi,
};
#[allow(clippy::module_name_repetitions)]
pub use client::{LibraryClient, LibraryClientBuilder};
pub use query::CatalogQuery;
pub use types::{CatalogItem, ItemImages, ItemKind, MediaSource, User};
