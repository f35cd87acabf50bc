//! Catalog synchronizer: authenticate, fetch, reconcile, prune.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use super::catalog_sync_model::{
    AccessToken, CatalogItem, QueryFailurePolicy, SyncPhase, SyncQuery, SyncReport, SyncRun,
    SyncTrigger,
};
use crate::errors::{Error, Result, SyncError};
use crate::releases::{ReleaseRepositoryTrait, META_LAST_SYNCED_AT, META_SYNC_QUERY};

/// Remote music catalog the synchronizer pulls releases from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Exchanges client credentials for a bearer token.
    async fn authenticate(&self) -> std::result::Result<AccessToken, SyncError>;

    /// Runs one search query with the given token.
    async fn search(
        &self,
        token: &AccessToken,
        query: &SyncQuery,
    ) -> std::result::Result<Vec<CatalogItem>, SyncError>;
}

/// Receives run lifecycle notifications. All methods default to no-ops.
pub trait SyncProgressReporter: Send + Sync {
    fn report_sync_start(&self, _trigger: SyncTrigger) {}

    fn report_phase(&self, _phase: SyncPhase) {}

    fn report_sync_complete(&self, _report: &SyncReport) {}
}

pub struct NoOpSyncProgressReporter;

impl SyncProgressReporter for NoOpSyncProgressReporter {}

/// Reconciles local release records against the remote catalog.
///
/// Runs are mutually exclusive: a trigger that arrives while another run holds
/// the lock gets [`SyncError::AlreadyRunning`] instead of racing it.
pub struct CatalogSynchronizer {
    source: Arc<dyn CatalogSource>,
    repository: Arc<dyn ReleaseRepositoryTrait>,
    queries: Vec<SyncQuery>,
    failure_policy: QueryFailurePolicy,
    reporter: Arc<dyn SyncProgressReporter>,
    run_lock: Mutex<()>,
}

impl CatalogSynchronizer {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        repository: Arc<dyn ReleaseRepositoryTrait>,
        queries: Vec<SyncQuery>,
    ) -> Self {
        Self {
            source,
            repository,
            queries,
            failure_policy: QueryFailurePolicy::default(),
            reporter: Arc::new(NoOpSyncProgressReporter),
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: QueryFailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn SyncProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn queries(&self) -> &[SyncQuery] {
        &self.queries
    }

    pub fn failure_policy(&self) -> QueryFailurePolicy {
        self.failure_policy
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Runs one full reconciliation.
    ///
    /// Auth and fetch failures abort the run and are returned as errors after
    /// the failed report has been handed to the reporter. Per-item failures
    /// are collected as warnings in the returned report.
    pub async fn run(&self, trigger: SyncTrigger) -> Result<SyncReport> {
        let _guard = self.run_lock.try_lock().map_err(|_| {
            warn!(
                "[ReleaseSync] {:?} trigger ignored: a run is already in progress",
                trigger
            );
            SyncError::AlreadyRunning
        })?;

        info!(
            "[ReleaseSync] Starting {:?} run with {} queries",
            trigger,
            self.queries.len()
        );
        self.reporter.report_sync_start(trigger);
        let mut report = SyncReport::new(trigger, self.queries.len());

        match self.execute(&mut report).await {
            Ok(()) => {
                report.finish();
                self.set_phase(SyncPhase::Done);
                info!(
                    "[ReleaseSync] Run complete status={:?} created={} updated={} deleted={} skipped={} image_failures={} pruned={}",
                    report.status,
                    report.created_count,
                    report.updated_count,
                    report.deleted_count,
                    report.skipped_count,
                    report.image_failures,
                    report.pruned
                );
                self.reporter.report_sync_complete(&report);
                Ok(report)
            }
            Err(err) => {
                report.fail(err.to_string());
                self.set_phase(SyncPhase::Failed);
                error!("[ReleaseSync] Run failed: {}", err);
                self.reporter.report_sync_complete(&report);
                Err(err)
            }
        }
    }

    fn set_phase(&self, phase: SyncPhase) {
        debug!("[ReleaseSync] Phase {:?}", phase);
        self.reporter.report_phase(phase);
    }

    async fn execute(&self, report: &mut SyncReport) -> Result<()> {
        self.set_phase(SyncPhase::Authenticating);
        let token = self.source.authenticate().await?;
        let mut run = SyncRun::new(token);

        let total = self.queries.len();
        for (index, query) in self.queries.iter().enumerate() {
            self.set_phase(SyncPhase::Fetching {
                index: index + 1,
                total,
            });
            let items = match self.source.search(&run.access_token, query).await {
                Ok(items) => items,
                Err(err) => match self.failure_policy {
                    QueryFailurePolicy::Abort => return Err(err.into()),
                    QueryFailurePolicy::Skip => {
                        warn!("[ReleaseSync] Skipping query '{}': {}", query.query, err);
                        report.failed_queries.push(query.query.clone());
                        report.warn(err.to_string());
                        continue;
                    }
                },
            };
            debug!(
                "[ReleaseSync] Query '{}' returned {} items",
                query.query,
                items.len()
            );
            report.fetched_count += items.len();

            for (position, item) in items.iter().enumerate() {
                self.set_phase(SyncPhase::Reconciling {
                    query: index + 1,
                    item: position + 1,
                });
                self.reconcile_item(&mut run, query, item, report).await?;
            }
        }

        if report.failed_queries.is_empty() {
            self.set_phase(SyncPhase::Pruning);
            report.deleted_count = self.prune(&run).await?;
            report.pruned = true;
        } else {
            let message = format!(
                "Prune skipped: {} of {} queries failed",
                report.failed_queries.len(),
                total
            );
            warn!("[ReleaseSync] {}", message);
            report.warn(message);
        }

        debug!(
            "[ReleaseSync] {} distinct releases synced this run",
            run.synced_count()
        );
        Ok(())
    }

    async fn reconcile_item(
        &self,
        run: &mut SyncRun,
        query: &SyncQuery,
        item: &CatalogItem,
        report: &mut SyncReport,
    ) -> Result<()> {
        let fields = match item.to_release_fields(query.genre) {
            Ok(fields) => fields,
            Err(err) => {
                warn!(
                    "[ReleaseSync] Skipping item from query '{}': {}",
                    query.query, err
                );
                report.skipped_count += 1;
                report.warn(err.to_string());
                return Ok(());
            }
        };

        if run.is_synced(&fields.external_id) {
            debug!(
                "[ReleaseSync] {} already synced this run, keeping first genre",
                fields.external_id
            );
            report.repeated_count += 1;
            return Ok(());
        }

        let external_id = fields.external_id.clone();
        let cover_url = fields.cover_image_url.clone();
        let existing = self.repository.find_by_external_id(&external_id)?;
        let release_id = match existing.split_first() {
            Some((keep, extras)) => {
                for extra in extras {
                    warn!(
                        "[ReleaseSync] Removing duplicate release {} for external id {}",
                        extra, external_id
                    );
                    self.repository.delete_release(extra, true).await?;
                    report.duplicates_removed += 1;
                }
                let id = self
                    .repository
                    .upsert_release(Some(keep.clone()), fields)
                    .await?;
                report.updated_count += 1;
                id
            }
            None => {
                let id = self.repository.upsert_release(None, fields).await?;
                debug!("[ReleaseSync] Created release {} for {}", id, external_id);
                report.created_count += 1;
                id
            }
        };
        run.mark_synced(external_id.clone());

        self.repository
            .set_meta(&release_id, META_LAST_SYNCED_AT, &Utc::now().to_rfc3339())
            .await?;
        self.repository
            .set_meta(&release_id, META_SYNC_QUERY, &query.query)
            .await?;

        self.attach_cover(&release_id, &external_id, &cover_url, report)
            .await;
        Ok(())
    }

    async fn attach_cover(
        &self,
        release_id: &str,
        external_id: &str,
        cover_url: &str,
        report: &mut SyncReport,
    ) {
        if cover_url.is_empty() {
            let message = format!("Release {} has no cover image URL", external_id);
            warn!("[ReleaseSync] {}", message);
            report.image_failures += 1;
            report.warn(message);
            return;
        }

        match self
            .repository
            .attach_image_from_url(release_id, cover_url)
            .await
        {
            Ok(media_id) => {
                debug!(
                    "[ReleaseSync] Cover {} attached to release {}",
                    media_id, release_id
                );
            }
            Err(err) => {
                let err = match err {
                    Error::Sync(sync_err @ SyncError::ImageAttach { .. }) => sync_err,
                    other => SyncError::image_attach(cover_url, other.to_string()),
                };
                warn!("[ReleaseSync] {}", err);
                report.image_failures += 1;
                report.warn(err.to_string());
            }
        }
    }

    async fn prune(&self, run: &SyncRun) -> Result<usize> {
        let mut deleted = 0;
        for release_id in self.repository.list_ids_with_external_id()? {
            let Some(external_id) = self.repository.get_external_id(&release_id)? else {
                continue;
            };
            if external_id.is_empty() || run.is_synced(&external_id) {
                continue;
            }
            deleted += self.repository.delete_release(&release_id, true).await?;
            info!(
                "[ReleaseSync] Pruned orphan release {} (external id {})",
                release_id, external_id
            );
        }
        Ok(deleted)
    }
}
