//! Shared sync types, policy knobs, and result shapes.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::entity::data_source::DataSource;
use crate::store::StoreError;

/// Horses whose last sync is older than this are due again.
pub const DEFAULT_STALENESS_DAYS: i64 = 7;

/// Maximum horses one batch pass picks up.
pub const DEFAULT_BATCH_LIMIT: u64 = 50;

/// Pause between horses in a batch pass. Batch sync is deliberately
/// sequential; this bounds the aggregate request pressure on the providers
/// on top of the per-source rate limits.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_secs(2);

/// Policy knobs for sync passes.
///
/// The defaults match production behavior; deployments tune them through
/// configuration rather than code.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Re-sync horses whose last sync is older than this.
    pub staleness_horizon: chrono::Duration,
    /// Maximum horses per batch pass.
    pub batch_limit: u64,
    /// Delay between consecutive horses in a batch pass.
    pub pacing_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            staleness_horizon: chrono::Duration::days(DEFAULT_STALENESS_DAYS),
            batch_limit: DEFAULT_BATCH_LIMIT,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }
}

/// Result of syncing one horse.
#[derive(Debug)]
pub struct HorseSyncResult {
    /// The horse that was synced.
    pub horse_id: Uuid,
    /// True when no per-source errors occurred.
    pub success: bool,
    /// Sources that delivered data this run.
    pub sources: Vec<DataSource>,
    /// Timeline entries inserted.
    pub added: usize,
    /// Timeline entries updated in place.
    pub updated: usize,
    /// Per-source error strings ("ehorses: timeout").
    pub errors: Vec<String>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

/// Aggregated result of a batch pass.
#[derive(Debug, Default)]
pub struct BatchSyncResult {
    /// Horses selected for the pass.
    pub attempted: usize,
    /// Horses that finished without per-source errors.
    pub synced: usize,
    /// Horses that finished with errors or failed outright.
    pub failed: usize,
    /// Timeline entries inserted across the pass.
    pub added: usize,
    /// Timeline entries updated across the pass.
    pub updated: usize,
    /// Accumulated error strings, prefixed with the horse.
    pub errors: Vec<String>,
}

/// Result of a market refresh slice (used by scraping jobs).
#[derive(Debug)]
pub struct MarketRefreshResult {
    /// Listings found at the marketplace.
    pub found: usize,
    /// Listings that became new timeline entries.
    pub added: usize,
    /// Listings that updated existing entries.
    pub updated: usize,
}

/// Errors that abort a sync operation.
///
/// Per-source fetch failures are NOT here - those are absorbed into the
/// result's error list. What propagates is a canonical-store failure or a
/// sync that cannot be set up at all.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Canonical store failure. Fails the current horse; the next scheduled
    /// pass retries it.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A job-path fetch failed and the job must be marked failed.
    #[error("{src}: {message}")]
    Source { src: DataSource, message: String },

    /// The horse has no identifier for the requested source.
    #[error("horse {horse_id} has no {src} identifier")]
    MissingIdentifier { horse_id: Uuid, src: DataSource },

    /// No adapter is registered for the source.
    #[error("no adapter registered for {src}")]
    MissingAdapter { src: DataSource },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_options_defaults() {
        let options = SyncOptions::default();
        assert_eq!(options.staleness_horizon, chrono::Duration::days(7));
        assert_eq!(options.batch_limit, 50);
        assert_eq!(options.pacing_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::Source {
            src: DataSource::Ehorses,
            message: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "ehorses: timeout");
    }
}
