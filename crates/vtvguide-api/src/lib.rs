//! Media library client library for vtvguide.
//!
//! Provides the catalog, identity, and playback-source interfaces the
//! virtual tuner consumes, plus an HTTP client for Emby-compatible servers.

/// Media library API client.
pub mod library;
