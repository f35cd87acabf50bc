//! Background loop that runs the release sync on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use releasesync_core::errors::{Error, SyncError};
use releasesync_core::sync::{
    CatalogSynchronizer, SyncBackoff, SyncRetryClass, SyncTrigger,
    RELEASE_SYNC_INTERVAL_JITTER_SECS,
};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Runs one scheduled sync and returns the delay in seconds before the next one.
///
/// A run rejected because another one holds the lock is not a failure and
/// does not touch the backoff streak.
pub async fn run_scheduled_sync(
    synchronizer: &CatalogSynchronizer,
    trigger: SyncTrigger,
    backoff: &mut SyncBackoff,
    interval_secs: u64,
) -> u64 {
    match synchronizer.run(trigger).await {
        Ok(report) => {
            debug!(
                "[ReleaseSync] Scheduled run finished status={:?} created={} updated={} deleted={}",
                report.status, report.created_count, report.updated_count, report.deleted_count
            );
            backoff.record_success()
        }
        Err(Error::Sync(SyncError::AlreadyRunning)) => {
            info!("[ReleaseSync] Scheduled run skipped: a run is already in progress");
            interval_secs
        }
        Err(Error::Sync(err)) => {
            let delay = backoff.record_failure(err.retry_class());
            warn!(
                "[ReleaseSync] Scheduled run failed ({} consecutive): {}. Next attempt in {}s",
                backoff.consecutive_failures(),
                err,
                delay
            );
            delay
        }
        Err(err) => {
            let delay = backoff.record_failure(SyncRetryClass::Retryable);
            warn!(
                "[ReleaseSync] Scheduled run failed ({} consecutive): {}. Next attempt in {}s",
                backoff.consecutive_failures(),
                err,
                delay
            );
            delay
        }
    }
}

fn jitter_ms() -> u64 {
    let bound = RELEASE_SYNC_INTERVAL_JITTER_SECS.saturating_mul(1000);
    if bound == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..bound)
}

/// Spawns the sync loop unless sync is unconfigured or the loop is already alive.
///
/// Returns whether a loop is running afterwards.
pub async fn ensure_scheduler_started(state: Arc<AppState>) -> bool {
    let Some(synchronizer) = state.synchronizer.clone() else {
        info!("[ReleaseSync] Catalog credentials not configured; scheduler not started");
        return false;
    };

    let mut guard = state.scheduler_task.lock().await;
    if let Some(handle) = guard.as_ref() {
        if !handle.is_finished() {
            return true;
        }
        guard.take();
    }

    let interval_secs = state.config.interval_secs.max(1);
    let run_on_startup = state.config.run_on_startup;
    info!(
        "[ReleaseSync] Scheduler started: every {}s, startup run {}",
        interval_secs,
        if run_on_startup { "enabled" } else { "disabled" }
    );

    let handle = tokio::spawn(async move {
        let mut backoff = SyncBackoff::new(interval_secs);
        let mut delay_secs = if run_on_startup { 0 } else { interval_secs };
        let mut trigger = if run_on_startup {
            SyncTrigger::Startup
        } else {
            SyncTrigger::Periodic
        };

        loop {
            if delay_secs > 0 {
                let delay_ms = delay_secs.saturating_mul(1000).saturating_add(jitter_ms());
                debug!("[ReleaseSync] Next scheduled run in {}ms", delay_ms);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            delay_secs =
                run_scheduled_sync(&synchronizer, trigger, &mut backoff, interval_secs).await;
            trigger = SyncTrigger::Periodic;
        }
    });
    *guard = Some(handle);
    true
}

pub async fn ensure_scheduler_stopped(state: &AppState) {
    if let Some(handle) = state.scheduler_task.lock().await.take() {
        handle.abort();
        info!("[ReleaseSync] Scheduler stopped");
    }
}
