//! Catalog API client: client-credentials token exchange and track search.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use releasesync_core::errors::SyncError;
use releasesync_core::sync::{AccessToken, CatalogItem, CatalogSource, SyncQuery};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tokio::time::sleep;

use crate::error::{CatalogClientError, Result};
use crate::types::{ApiErrorResponse, OAuthErrorResponse, SearchResponse, TokenResponse};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SEARCH_URL: &str = "https://api.spotify.com/v1/search";
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const MAX_LOG_BODY_CHARS: usize = 512;
const REQUEST_MAX_ATTEMPTS: usize = 3;
const REQUEST_BASE_BACKOFF_MS: u64 = 250;
const REQUEST_MAX_BACKOFF_MS: u64 = 4_000;

fn backoff_with_jitter(attempt: usize) -> Duration {
    let exp = (attempt.saturating_sub(1) as u32).min(8);
    let backoff =
        (REQUEST_BASE_BACKOFF_MS.saturating_mul(1_u64 << exp)).min(REQUEST_MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=(backoff / 5).max(1));
    Duration::from_millis(backoff.saturating_add(jitter))
}

/// Endpoints and credentials for the catalog API.
#[derive(Clone)]
pub struct CatalogClientConfig {
    pub token_url: String,
    pub search_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub search_limit: u32,
    pub timeout: Duration,
}

impl CatalogClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for CatalogClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClientConfig")
            .field("token_url", &self.token_url)
            .field("search_url", &self.search_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("search_limit", &self.search_limit)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the remote music catalog.
///
/// Every [`CatalogSource::authenticate`] call performs a fresh token exchange;
/// tokens are not cached between runs.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    config: CatalogClientConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    pub fn config(&self) -> &CatalogClientConfig {
        &self.config
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[ReleaseSync] Catalog response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[ReleaseSync] Catalog response error ({}): {}", status, preview);
    }

    /// Builds the error for a non-success response, accepting either error shape.
    fn error_from_body(status: reqwest::StatusCode, body: &str) -> CatalogClientError {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            return CatalogClientError::api(status.as_u16(), error.error.message);
        }
        if let Ok(error) = serde_json::from_str::<OAuthErrorResponse>(body) {
            let message = match error.error_description {
                Some(description) => format!("{}: {}", error.error, description),
                None => error.error,
            };
            return CatalogClientError::api(status.as_u16(), message);
        }
        CatalogClientError::api(status.as_u16(), format!("Request failed: {}", body))
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::error_from_body(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("[ReleaseSync] Failed to decode catalog response: {}", e);
            CatalogClientError::Json(e)
        })
    }

    /// Sends the request built by `build`, retrying transient failures with
    /// exponential backoff and jitter.
    async fn send_with_retry<T, F>(&self, label: &str, build: F) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> Result<reqwest::RequestBuilder>,
    {
        let mut attempt = 0usize;
        loop {
            attempt = attempt.saturating_add(1);
            let result = match build()?.send().await {
                Ok(response) => Self::parse_response(response).await,
                Err(err) => Err(CatalogClientError::Http(err)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < REQUEST_MAX_ATTEMPTS => {
                    let backoff = backoff_with_jitter(attempt);
                    warn!(
                        "[ReleaseSync] {} failed (attempt {}/{}), retrying in {:?}: {}",
                        label, attempt, REQUEST_MAX_ATTEMPTS, backoff, err
                    );
                    sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Exchanges the configured client credentials for a bearer token.
    ///
    /// POST {token_url} (form: grant_type=client_credentials)
    pub async fn request_token(&self) -> Result<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response: TokenResponse = self
            .send_with_retry("Token exchange", || {
                Ok(self.client.post(&self.config.token_url).form(&form))
            })
            .await?;

        let token = response
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| CatalogClientError::auth("Token response has no access_token"))?;

        let mut access_token = AccessToken::bearer(token, response.expires_in);
        if let Some(token_type) = response.token_type {
            access_token.token_type = token_type;
        }
        Ok(access_token)
    }

    /// Searches tracks and maps each hit to its album.
    ///
    /// GET {search_url}?q={query}&type=track&limit={n}
    pub async fn search_tracks(&self, token: &AccessToken, query: &str) -> Result<Vec<CatalogItem>> {
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token.token))
            .map_err(|_| CatalogClientError::auth("Invalid access token format"))?;
        let limit = self.config.search_limit.to_string();
        let params = [("q", query), ("type", "track"), ("limit", limit.as_str())];

        debug!("[ReleaseSync] Searching catalog: {}", query);
        let response: SearchResponse = self
            .send_with_retry("Catalog search", || {
                Ok(self
                    .client
                    .get(&self.config.search_url)
                    .header(AUTHORIZATION, auth_value.clone())
                    .query(&params))
            })
            .await?;

        let page = response
            .tracks
            .ok_or_else(|| CatalogClientError::unexpected("Search response has no tracks page"))?;
        Ok(page.items.into_iter().map(CatalogItem::from).collect())
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn authenticate(&self) -> std::result::Result<AccessToken, SyncError> {
        self.request_token()
            .await
            .map_err(CatalogClientError::into_auth_error)
    }

    async fn search(
        &self,
        token: &AccessToken,
        query: &SyncQuery,
    ) -> std::result::Result<Vec<CatalogItem>, SyncError> {
        self.search_tracks(token, &query.query)
            .await
            .map_err(|err| err.into_fetch_error(&query.query))
    }
}
