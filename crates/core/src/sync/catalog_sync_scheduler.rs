//! Scheduling and retry policy for the periodic release sync job.

use serde::{Deserialize, Serialize};

/// Periodic sync cadence in seconds (twelve hours).
pub const RELEASE_SYNC_INTERVAL_SECS: u64 = 60 * 60 * 12;

/// Maximum jitter (seconds) added to periodic run intervals.
pub const RELEASE_SYNC_INTERVAL_JITTER_SECS: u64 = 30;

/// First retry delay after a retryable failure; doubles per consecutive failure.
pub const RELEASE_SYNC_RETRY_BASE_SECS: u64 = 60;

const MAX_RETRY_EXPONENT: u32 = 10;

/// Retry policy classification for catalog API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Classify an HTTP status from the catalog API into retry behavior.
pub fn classify_http_status(status: u16) -> SyncRetryClass {
    match status {
        401 | 403 => SyncRetryClass::ReauthRequired,
        408 | 425 | 429 => SyncRetryClass::Retryable,
        500..=599 => SyncRetryClass::Retryable,
        _ => SyncRetryClass::Permanent,
    }
}

/// Tracks consecutive failed runs and decides when the next run is due.
#[derive(Debug, Clone)]
pub struct SyncBackoff {
    interval_secs: u64,
    consecutive_failures: u32,
}

impl SyncBackoff {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs: interval_secs.max(1),
            consecutive_failures: 0,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Resets the failure streak; the next run waits a full interval.
    pub fn record_success(&mut self) -> u64 {
        self.consecutive_failures = 0;
        self.interval_secs
    }

    /// Returns the delay before the next attempt.
    ///
    /// Retryable failures back off exponentially, capped at the regular
    /// interval. Auth and permanent failures wait for the next regular slot.
    pub fn record_failure(&mut self, retry_class: SyncRetryClass) -> u64 {
        let exponent = self.consecutive_failures.min(MAX_RETRY_EXPONENT);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        match retry_class {
            SyncRetryClass::Retryable => RELEASE_SYNC_RETRY_BASE_SECS
                .saturating_mul(1_u64 << exponent)
                .min(self.interval_secs),
            SyncRetryClass::Permanent | SyncRetryClass::ReauthRequired => self.interval_secs,
        }
    }
}
