use std::sync::{Arc, RwLock};

use anyhow::Context;
use releasesync_catalog_client::{CatalogClient, HttpImageFetcher, TicketmasterClient};
use releasesync_core::events::{EventService, EventServiceTrait};
use releasesync_core::sync::{
    CatalogSource, CatalogSynchronizer, SyncPhase, SyncProgressReporter, SyncReport, SyncTrigger,
};
use releasesync_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, EventRepository, ReleaseRepository,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;

/// Last known progress of the release sync, shared between the synchronizer
/// and the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusSnapshot {
    pub phase: SyncPhase,
    pub current_trigger: Option<SyncTrigger>,
    pub last_report: Option<SyncReport>,
}

impl Default for SyncStatusSnapshot {
    fn default() -> Self {
        Self {
            phase: SyncPhase::Idle,
            current_trigger: None,
            last_report: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncStatusTracker {
    inner: RwLock<SyncStatusSnapshot>,
}

impl SyncStatusTracker {
    pub fn snapshot(&self) -> SyncStatusSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut SyncStatusSnapshot)) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }
}

impl SyncProgressReporter for SyncStatusTracker {
    fn report_sync_start(&self, trigger: SyncTrigger) {
        self.update(|status| {
            status.current_trigger = Some(trigger);
            status.phase = SyncPhase::Idle;
        });
    }

    fn report_phase(&self, phase: SyncPhase) {
        self.update(|status| status.phase = phase);
    }

    fn report_sync_complete(&self, report: &SyncReport) {
        self.update(|status| {
            status.current_trigger = None;
            status.last_report = Some(report.clone());
        });
    }
}

pub struct AppState {
    pub config: Config,
    pub release_repository: Arc<ReleaseRepository>,
    pub event_service: Arc<dyn EventServiceTrait>,
    /// `None` when catalog credentials are not configured.
    pub synchronizer: Option<Arc<CatalogSynchronizer>>,
    pub sync_status: Arc<SyncStatusTracker>,
    pub ticketmaster: Option<TicketmasterClient>,
    pub scheduler_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    pub async fn scheduler_running(&self) -> bool {
        self.scheduler_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

pub fn build_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let source = config
        .catalog
        .clone()
        .map(|catalog| Arc::new(CatalogClient::new(catalog)) as Arc<dyn CatalogSource>);
    build_state_with_source(config, source)
}

/// Wires storage, services and the synchronizer around the given catalog source.
pub fn build_state_with_source(
    config: Config,
    source: Option<Arc<dyn CatalogSource>>,
) -> anyhow::Result<Arc<AppState>> {
    let data_dir = config.data_dir.to_string_lossy().to_string();
    let db_path = init(&data_dir).context("Failed to initialize data directory")?;
    run_migrations(&db_path).context("Failed to run database migrations")?;
    let pool = create_pool(&db_path).context("Failed to create database pool")?;
    let writer = spawn_writer(pool.as_ref().clone());
    info!("Database ready at {}", db_path);

    let image_fetcher = Arc::new(HttpImageFetcher::new(config.http_timeout));
    let release_repository = Arc::new(ReleaseRepository::new(
        pool.clone(),
        writer.clone(),
        image_fetcher,
    ));
    let event_service: Arc<dyn EventServiceTrait> = Arc::new(EventService::new(Arc::new(
        EventRepository::new(pool, writer),
    )));

    let sync_status = Arc::new(SyncStatusTracker::default());
    let synchronizer = source.map(|source| {
        Arc::new(
            CatalogSynchronizer::new(source, release_repository.clone(), config.queries.clone())
                .with_failure_policy(config.failure_policy)
                .with_reporter(sync_status.clone()),
        )
    });

    let ticketmaster = config.ticketmaster.clone().map(TicketmasterClient::new);

    Ok(Arc::new(AppState {
        config,
        release_repository,
        event_service,
        synchronizer,
        sync_status,
        ticketmaster,
        scheduler_task: Mutex::new(None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use releasesync_core::sync::SyncRunStatus;

    #[test]
    fn tracker_records_phases_and_last_report() {
        let tracker = SyncStatusTracker::default();
        tracker.report_sync_start(SyncTrigger::Manual);
        tracker.report_phase(SyncPhase::Fetching { index: 2, total: 3 });

        let running = tracker.snapshot();
        assert_eq!(running.current_trigger, Some(SyncTrigger::Manual));
        assert_eq!(running.phase, SyncPhase::Fetching { index: 2, total: 3 });
        assert!(running.last_report.is_none());

        let mut report = SyncReport::new(SyncTrigger::Manual, 3);
        report.finish();
        tracker.report_phase(SyncPhase::Done);
        tracker.report_sync_complete(&report);

        let done = tracker.snapshot();
        assert_eq!(done.current_trigger, None);
        assert_eq!(done.phase, SyncPhase::Done);
        assert_eq!(
            done.last_report.map(|r| r.status),
            Some(SyncRunStatus::Completed)
        );
    }
}
