//! `LibraryClient` - Emby-compatible library server client implementation.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::api::{LocalCatalogApi, LocalIdentityApi, LocalMediaSourceApi};
use super::query::{CatalogQuery, ITEM_FIELDS};
use super::types::{CatalogItem, ItemsResponse, MediaSource, PlaybackInfoResponse, User};

/// Default base URL of a local server.
const DEFAULT_BASE_URL: &str = "http://localhost:8096/emby/";

/// Header carrying the API key.
const TOKEN_HEADER: &str = "X-Emby-Token";

/// Maximum number of retries for HTTP 429 responses.
const MAX_RETRIES: u32 = 3;

/// Default backoff between retries (multiplied by the retry count).
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Library server API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct LibraryClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests (always ends with `/`).
    base_url: Url,
    /// API key.
    api_key: String,
    /// Backoff between 429 retries.
    retry_backoff: Duration,
}

/// Builder for `LibraryClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct LibraryClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    retry_backoff: Option<Duration>,
}

impl LibraryClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            retry_backoff: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the backoff between 429 retries (default: 1s).
    #[must_use]
    pub const fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = Some(backoff);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<LibraryClient> {
        let api_key = self.api_key.context("api_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let mut base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };
        // `Url::join` drops the last path segment unless it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(LibraryClient {
            http_client,
            base_url,
            api_key,
            retry_backoff: self.retry_backoff.unwrap_or(RETRY_BACKOFF),
        })
    }
}

impl LibraryClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> LibraryClientBuilder {
        LibraryClientBuilder::new()
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a GET request with the API key and query params.
    /// Retries up to `MAX_RETRIES` times on HTTP 429.
    ///
    /// Returns `None` on HTTP 404.
    #[instrument(skip_all)]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let mut retries = 0u32;
        loop {
            let request = self
                .http_client
                .get(url.clone())
                .header(TOKEN_HEADER, &self.api_key)
                .query(query)
                .build()
                .with_context(|| format!("failed to build request: {path}"))?;

            tracing::debug!(url = %request.url(), "Library API request");

            let result = self.http_client.execute(request).await;
            let response = result.with_context(|| format!("request failed: {path}"))?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries = retries.saturating_add(1);
                if retries > MAX_RETRIES {
                    bail!("Library API rate limit exceeded after {MAX_RETRIES} retries: {path}");
                }
                tracing::warn!(
                    retry = retries,
                    max_retries = MAX_RETRIES,
                    "Library API rate limited (429). Retrying..."
                );
                tokio::time::sleep(self.retry_backoff.saturating_mul(retries)).await;
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                tracing::debug!(%path, "Library API returned 404");
                return Ok(None);
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<failed to read body>"));
                bail!("Library API error (HTTP {status}): {body}");
            }

            let body = response
                .text()
                .await
                .with_context(|| format!("failed to read response body: {path}"))?;
            let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
            let parsed =
                raw_result.with_context(|| format!("failed to decode JSON response: {path}"))?;
            return Ok(Some(parsed));
        }
    }
}

impl LocalCatalogApi for LibraryClient {
    #[instrument(skip_all, fields(user_id = %query.user_id))]
    async fn find_items(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>> {
        let path = format!("Users/{}/Items", query.user_id);
        let response: Option<ItemsResponse> =
            self.get_json(&path, &query.to_query_pairs()).await?;
        let items = response.map_or_else(Vec::new, |r| r.items);

        tracing::debug!(count = items.len(), "Catalog items fetched");
        Ok(items
            .into_iter()
            .map(|dto| dto.into_item(&self.base_url))
            .collect())
    }

    #[instrument(skip_all, fields(item_id = %item_id))]
    async fn get_item(&self, item_id: &str) -> Result<Option<CatalogItem>> {
        let query = [
            ("Ids", String::from(item_id)),
            ("Fields", String::from(ITEM_FIELDS)),
        ];
        let response: Option<ItemsResponse> = self.get_json("Items", &query).await?;
        Ok(response
            .and_then(|r| r.items.into_iter().next())
            .map(|dto| dto.into_item(&self.base_url)))
    }
}

impl LocalIdentityApi for LibraryClient {
    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let path = format!("Users/{user_id}");
        self.get_json(&path, &[]).await
    }
}

impl LocalMediaSourceApi for LibraryClient {
    #[instrument(skip_all, fields(item_id = %item_id))]
    async fn playback_sources(&self, item_id: &str) -> Result<Vec<MediaSource>> {
        let path = format!("Items/{item_id}/PlaybackInfo");
        let response: Option<PlaybackInfoResponse> = self.get_json(&path, &[]).await?;
        Ok(response.map_or_else(Vec::new, |r| r.media_sources))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use chrono::TimeDelta;

    use super::*;
    use crate::library::types::ItemKind;

    fn client_for(server: &wiremock::MockServer) -> LibraryClient {
        let base_url = format!("{}/emby/", server.uri());
        LibraryClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .retry_backoff(Duration::from_millis(0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_key() {
        // Arrange & Act
        let result = LibraryClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_key is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = LibraryClient::builder().api_key("test-key").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_default_base_url() {
        // Arrange & Act
        let client = LibraryClient::builder()
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_builder_appends_trailing_slash() {
        // Arrange
        let url = Url::parse("http://media.local:8096/emby").unwrap();

        // Act
        let client = LibraryClient::builder()
            .base_url(url)
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url().as_str(), "http://media.local:8096/emby/");
    }

    #[tokio::test]
    async fn test_find_items_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/library/items_favorite_movies.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/emby/Users/user-1/Items"))
            .and(wiremock::matchers::query_param("IsFavorite", "true"))
            .and(wiremock::matchers::query_param("IncludeItemTypes", "Movie"))
            .and(wiremock::matchers::header(TOKEN_HEADER, "test-key"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let query = CatalogQuery::favorites("user-1").with_item_types(&[ItemKind::Movie]);

        // Act
        let items = client.find_items(&query).await.unwrap();

        // Assert: catalog order is preserved
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "101");
        assert_eq!(items[0].runtime(), Some(TimeDelta::minutes(120)));
        assert_eq!(items[1].id, "102");
        assert!(items[2].runtime().is_none());
        assert!(
            items[0]
                .images
                .primary
                .as_deref()
                .unwrap()
                .ends_with("/emby/Items/101/Images/Primary?tag=p101")
        );
    }

    #[tokio::test]
    async fn test_get_item_found() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/library/item_episode.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/emby/Items"))
            .and(wiremock::matchers::query_param("Ids", "301"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let item = client.get_item("301").await.unwrap().unwrap();

        // Assert
        assert_eq!(item.kind, ItemKind::Episode);
        assert_eq!(item.series_id.as_deref(), Some("300"));
        assert_eq!(item.index_number, Some(3));
        assert_eq!(item.parent_index_number, Some(1));
    }

    #[tokio::test]
    async fn test_get_item_missing_returns_none() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/emby/Items"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(r#"{"Items":[],"TotalRecordCount":0}"#),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let item = client.get_item("999").await.unwrap();

        // Assert
        assert!(item.is_none());
    }

    #[tokio::test]
    async fn test_get_user_found_and_missing() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/emby/Users/user-1"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(r#"{"Id":"user-1","Name":"alice"}"#),
            )
            .mount(&mock_server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/emby/Users/gone"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let found = client.get_user("user-1").await.unwrap();
        let missing = client.get_user("gone").await.unwrap();

        // Assert
        assert_eq!(found.unwrap().name, "alice");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_playback_sources_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/library/playback_info.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/emby/Items/101/PlaybackInfo"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let sources = client.playback_sources("101").await.unwrap();

        // Assert
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "ms-101");
        assert_eq!(sources[0].protocol.as_deref(), Some("File"));
        assert!(sources[0].supports_direct_play);
    }

    #[tokio::test]
    async fn test_http_error_returns_library_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(401).set_body_string("Access token is invalid"),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let result = client.get_user("user-1").await;

        // Assert
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Library API error"));
        assert!(err.contains("Access token is invalid"));
    }

    #[tokio::test]
    async fn test_http_429_retries() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        // Return 429 for all requests; expect retries + initial = MAX_RETRIES + 1
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(429))
            .expect(u64::from(MAX_RETRIES) + 1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let result = client.playback_sources("101").await;

        // Assert
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_invalid_json_returns_decode_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let result = client.find_items(&CatalogQuery::favorites("user-1")).await;

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("failed to decode JSON response")
        );
    }
}
