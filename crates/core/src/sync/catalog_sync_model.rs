//! Release sync domain models.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, SyncError};
use crate::releases::{GenreLabel, PublishStatus, ReleaseFields};

/// A genre-tagged search issued against the remote catalog on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQuery {
    pub query: String,
    pub genre: GenreLabel,
}

impl SyncQuery {
    pub fn new(query: impl Into<String>, genre: GenreLabel) -> Self {
        Self {
            query: query.into(),
            genre,
        }
    }
}

/// Built-in query list used when no queries file is configured.
pub fn default_sync_queries() -> Vec<SyncQuery> {
    vec![
        SyncQuery::new("genre:r-n-b", GenreLabel::RnB),
        SyncQuery::new("genre:dance", GenreLabel::Dance),
        SyncQuery::new("genre:hip-hop", GenreLabel::HipHop),
    ]
}

/// Bearer token owned by a single run. Never cached across runs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_in: Option<i64>,
}

impl AccessToken {
    pub fn bearer(token: impl Into<String>, expires_in: Option<i64>) -> Self {
        Self {
            token: token.into(),
            token_type: "Bearer".to_string(),
            fetched_at: Utc::now(),
            expires_in,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_in {
            Some(secs) => now >= self.fetched_at + chrono::Duration::seconds(secs),
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("fetched_at", &self.fetched_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// One item returned by a catalog search, as decoded from the wire.
///
/// Every field is optional so a malformed item can be reported and skipped
/// instead of failing the whole response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub album_id: Option<String>,
    pub album_name: Option<String>,
    pub artist_name: Option<String>,
    pub streaming_url: Option<String>,
    pub cover_image_url: Option<String>,
}

fn required_field(value: &Option<String>, name: &str) -> Result<String, SyncError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SyncError::malformed(format!("missing {}", name)))
}

impl CatalogItem {
    /// Maps the item onto release fields. Synced records are always published.
    pub fn to_release_fields(&self, genre: GenreLabel) -> Result<ReleaseFields, SyncError> {
        Ok(ReleaseFields {
            external_id: required_field(&self.album_id, "album.id")?,
            title: required_field(&self.album_name, "album.name")?,
            artist_name: required_field(&self.artist_name, "album.artists[0].name")?,
            genre,
            streaming_url: required_field(&self.streaming_url, "album.external_urls.spotify")?,
            cover_image_url: self
                .cover_image_url
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            status: PublishStatus::Publish,
        })
    }
}

/// Transient state of one run: the token and the external ids seen so far.
#[derive(Debug)]
pub struct SyncRun {
    pub access_token: AccessToken,
    synced: HashSet<String>,
}

impl SyncRun {
    pub fn new(access_token: AccessToken) -> Self {
        Self {
            access_token,
            synced: HashSet::new(),
        }
    }

    pub fn mark_synced(&mut self, external_id: impl Into<String>) -> bool {
        self.synced.insert(external_id.into())
    }

    pub fn is_synced(&self, external_id: &str) -> bool {
        self.synced.contains(external_id)
    }

    pub fn synced_count(&self) -> usize {
        self.synced.len()
    }
}

/// What to do when a single search query fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFailurePolicy {
    /// Abort the whole run.
    #[default]
    Abort,
    /// Record the failure, continue with the remaining queries, and skip pruning.
    Skip,
}

impl FromStr for QueryFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(QueryFailurePolicy::Abort),
            "skip" => Ok(QueryFailurePolicy::Skip),
            other => Err(Error::validation(format!(
                "Unknown query failure policy '{}' (expected 'abort' or 'skip')",
                other
            ))),
        }
    }
}

/// Trigger source for sync runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Startup,
    Periodic,
    Manual,
}

/// Progress of a run through its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum SyncPhase {
    Idle,
    Authenticating,
    Fetching { index: usize, total: usize },
    Reconciling { query: usize, item: usize },
    Pruning,
    Done,
    Failed,
}

/// Outcome classification of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Completed,
    CompletedWithWarnings,
    Failed,
}

/// Summary of one run, reported to progress reporters and returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub trigger: SyncTrigger,
    pub status: SyncRunStatus,
    pub queries_total: usize,
    pub failed_queries: Vec<String>,
    pub fetched_count: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub deleted_count: usize,
    pub duplicates_removed: usize,
    pub skipped_count: usize,
    pub repeated_count: usize,
    pub image_failures: usize,
    pub pruned: bool,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl SyncReport {
    pub fn new(trigger: SyncTrigger, queries_total: usize) -> Self {
        Self {
            trigger,
            status: SyncRunStatus::Completed,
            queries_total,
            failed_queries: Vec::new(),
            fetched_count: 0,
            created_count: 0,
            updated_count: 0,
            deleted_count: 0,
            duplicates_removed: 0,
            skipped_count: 0,
            repeated_count: 0,
            image_failures: 0,
            pruned: false,
            warnings: Vec::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn finish(&mut self) {
        self.status = if self.warnings.is_empty() {
            SyncRunStatus::Completed
        } else {
            SyncRunStatus::CompletedWithWarnings
        };
        self.stamp_finished();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SyncRunStatus::Failed;
        self.error = Some(message.into());
        self.stamp_finished();
    }

    fn stamp_finished(&mut self) {
        let now = Utc::now();
        self.duration_ms = Some((now - self.started_at).num_milliseconds());
        self.finished_at = Some(now);
    }
}
