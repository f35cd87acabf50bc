//! Server configuration read from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use releasesync_catalog_client::client::{
    DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_URL,
};
use releasesync_catalog_client::ticketmaster::DEFAULT_EVENTS_URL;
use releasesync_catalog_client::{CatalogClientConfig, TicketmasterConfig};
use releasesync_core::sync::{
    default_sync_queries, QueryFailurePolicy, SyncQuery, RELEASE_SYNC_INTERVAL_SECS,
};
use serde::Deserialize;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8088";
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub data_dir: PathBuf,
    /// `None` when client credentials are missing; sync is then disabled.
    pub catalog: Option<CatalogClientConfig>,
    pub queries: Vec<SyncQuery>,
    pub interval_secs: u64,
    pub run_on_startup: bool,
    pub failure_policy: QueryFailurePolicy,
    pub http_timeout: Duration,
    pub ticketmaster: Option<TicketmasterConfig>,
}

#[derive(Debug, Deserialize)]
struct QueriesFile {
    #[serde(default)]
    queries: Vec<SyncQuery>,
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_url(key: &str, default: &str) -> String {
    env_value(key)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|| default.to_string())
}

fn env_parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_value(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}='{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn env_flag(key: &str) -> bool {
    matches!(
        env_value(key).map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

/// Parses a TOML queries file of `[[queries]]` tables with `query` and `genre`.
pub fn parse_queries(contents: &str) -> anyhow::Result<Vec<SyncQuery>> {
    let parsed: QueriesFile = toml::from_str(contents).context("Invalid queries file")?;
    if parsed.queries.is_empty() {
        anyhow::bail!("Queries file defines no [[queries]] entries");
    }
    if let Some(blank) = parsed.queries.iter().find(|q| q.query.trim().is_empty()) {
        anyhow::bail!("Queries file has an empty query for genre {}", blank.genre);
    }
    Ok(parsed.queries)
}

pub fn load_queries(path: &Path) -> anyhow::Result<Vec<SyncQuery>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read queries file {}", path.display()))?;
    parse_queries(&contents)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let http_timeout =
            Duration::from_secs(env_parsed("RELEASESYNC_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);

        let catalog = match (
            env_value("CATALOG_CLIENT_ID"),
            env_value("CATALOG_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(CatalogClientConfig {
                token_url: env_url("CATALOG_TOKEN_URL", DEFAULT_TOKEN_URL),
                search_url: env_url("CATALOG_SEARCH_URL", DEFAULT_SEARCH_URL),
                client_id,
                client_secret,
                search_limit: env_parsed("CATALOG_SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?,
                timeout: http_timeout,
            }),
            _ => None,
        };

        let queries = match env_value("RELEASESYNC_QUERIES_FILE") {
            Some(path) => load_queries(Path::new(&path))?,
            None => default_sync_queries(),
        };

        let failure_policy = match env_value("RELEASESYNC_QUERY_FAILURE_POLICY") {
            Some(raw) => raw.parse::<QueryFailurePolicy>()?,
            None => QueryFailurePolicy::default(),
        };

        let ticketmaster = env_value("TICKETMASTER_API_KEY").map(|api_key| TicketmasterConfig {
            events_url: env_url("TICKETMASTER_EVENTS_URL", DEFAULT_EVENTS_URL),
            api_key,
            keyword: env_value("TICKETMASTER_KEYWORD"),
            timeout: http_timeout,
        });

        Ok(Self {
            listen_addr: env_value("RELEASESYNC_LISTEN_ADDR")
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            data_dir: PathBuf::from(
                env_value("RELEASESYNC_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            catalog,
            queries,
            interval_secs: env_parsed("RELEASESYNC_INTERVAL_SECS", RELEASE_SYNC_INTERVAL_SECS)?,
            run_on_startup: env_flag("RELEASESYNC_RUN_ON_STARTUP"),
            failure_policy,
            http_timeout,
            ticketmaster,
        })
    }

    pub fn sync_enabled(&self) -> bool {
        self.catalog.is_some()
    }
}
