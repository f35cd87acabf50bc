use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use releasesync_core::errors::SyncError;
use releasesync_core::releases::GenreLabel;
use releasesync_core::sync::{
    AccessToken, CatalogItem, CatalogSource, QueryFailurePolicy, SyncQuery,
};
use tempfile::TempDir;
use tokio::sync::Notify;

use crate::config::Config;
use crate::main_lib::{build_state_with_source, AppState};

pub const TEST_QUERY: &str = "genre:dance";

enum Script {
    Healthy,
    FailAuth(Option<u16>),
    FailFetch(Option<u16>),
    Blocked(Arc<Notify>),
}

/// Catalog source returning one release per search, or a scripted failure.
pub struct ScriptedSource {
    script: Script,
}

impl ScriptedSource {
    fn with(script: Script) -> Self {
        Self { script }
    }

    pub fn healthy() -> Self {
        Self::with(Script::Healthy)
    }

    pub fn failing_auth(status: Option<u16>) -> Self {
        Self::with(Script::FailAuth(status))
    }

    pub fn failing_fetch(status: Option<u16>) -> Self {
        Self::with(Script::FailFetch(status))
    }

    /// Searches park until `release` is notified.
    pub fn blocked(release: Arc<Notify>) -> Self {
        Self::with(Script::Blocked(release))
    }
}

pub fn release_item() -> CatalogItem {
    CatalogItem {
        album_id: Some("A1".to_string()),
        album_name: Some("Night Drive".to_string()),
        artist_name: Some("Lumen".to_string()),
        streaming_url: Some("https://open.spotify.com/album/A1".to_string()),
        cover_image_url: None,
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn authenticate(&self) -> Result<AccessToken, SyncError> {
        match &self.script {
            Script::FailAuth(status) => Err(SyncError::auth("invalid_client", *status)),
            _ => Ok(AccessToken::bearer("tok", Some(3600))),
        }
    }

    async fn search(
        &self,
        _token: &AccessToken,
        query: &SyncQuery,
    ) -> Result<Vec<CatalogItem>, SyncError> {
        match &self.script {
            Script::FailFetch(status) => {
                Err(SyncError::fetch(&query.query, "connection reset", *status))
            }
            Script::Blocked(release) => {
                release.notified().await;
                Ok(vec![release_item()])
            }
            _ => Ok(vec![release_item()]),
        }
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        listen_addr: "127.0.0.1:0".to_string(),
        data_dir: dir.path().to_path_buf(),
        catalog: None,
        queries: vec![SyncQuery::new(TEST_QUERY, GenreLabel::Dance)],
        interval_secs: 600,
        run_on_startup: false,
        failure_policy: QueryFailurePolicy::Abort,
        http_timeout: Duration::from_secs(5),
        ticketmaster: None,
    }
}

pub fn state_with(
    source: Option<ScriptedSource>,
    configure: impl FnOnce(&mut Config),
) -> (Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(&dir);
    configure(&mut config);
    let source = source.map(|s| Arc::new(s) as Arc<dyn CatalogSource>);
    let state = build_state_with_source(config, source).expect("state");
    (state, dir)
}

pub fn scripted_state(source: ScriptedSource) -> (Arc<AppState>, TempDir) {
    state_with(Some(source), |_| {})
}

pub fn unconfigured_state() -> (Arc<AppState>, TempDir) {
    state_with(None, |_| {})
}
