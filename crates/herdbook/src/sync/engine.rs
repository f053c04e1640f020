//! The sync orchestrator.
//!
//! [`SyncEngine::sync_horse`] drives one horse's multi-source sync: plan
//! the fetches from the horse's external identifiers, run them
//! concurrently, wait for all of them to settle regardless of individual
//! outcomes, merge the union of records through the reconciliation engine,
//! and record the outcome on the horse.
//!
//! [`SyncEngine::sync_batch`] runs due horses strictly sequentially with a
//! pacing delay - a deliberate politeness trade-off, since the providers
//! are rate-limited regardless.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::entity::data_source::DataSource;
use crate::entity::fetch_cache::DataType;
use crate::entity::horse::Model as HorseModel;
use crate::entity::sync_status::SyncStatus;
use crate::rate_limit::SourceRateLimiter;
use crate::reconcile;
use crate::source::{CandidateRecord, FetchContext, FetchOutcome, SourceAdapter};
use crate::store;

use super::types::{
    BatchSyncResult, HorseSyncResult, MarketRefreshResult, SyncError, SyncOptions,
};

/// The data types a scheduled sync fetches per source. Live results are
/// excluded: they are pulled on demand, never on the schedule.
fn sync_data_types(source: DataSource) -> &'static [DataType] {
    match source {
        DataSource::Fei => &[DataType::Profile, DataType::Competitions],
        DataSource::Horsetelex => &[DataType::Pedigree, DataType::Indices],
        DataSource::Ehorses => &[DataType::SaleListings],
    }
}

/// Sync orchestrator over a set of registered source adapters.
#[derive(Clone)]
pub struct SyncEngine {
    db: Arc<DatabaseConnection>,
    limiter: SourceRateLimiter,
    adapters: HashMap<DataSource, Arc<dyn SourceAdapter>>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        db: Arc<DatabaseConnection>,
        limiter: SourceRateLimiter,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        options: SyncOptions,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.source(), adapter))
            .collect();
        Self {
            db,
            limiter,
            adapters,
            options,
        }
    }

    /// The shared database handle.
    pub fn db(&self) -> &Arc<DatabaseConnection> {
        &self.db
    }

    /// The policy knobs this engine runs with.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// The fetches a sync run performs for this horse: one per
    /// (registered adapter, present identifier, supported data type).
    fn planned_fetches(
        &self,
        horse: &HorseModel,
    ) -> Vec<(Arc<dyn SourceAdapter>, String, DataType)> {
        let mut fetches = Vec::new();
        for source in DataSource::ALL {
            let Some(adapter) = self.adapters.get(&source) else {
                continue;
            };
            let Some(identifier) = horse.external_id(source) else {
                continue;
            };
            for &data_type in sync_data_types(source) {
                if adapter.supports(data_type) {
                    fetches.push((Arc::clone(adapter), identifier.to_string(), data_type));
                }
            }
        }
        fetches
    }

    /// Sync one horse across all sources it has identifiers for.
    ///
    /// Store failures propagate (and mark the horse `error` for the next
    /// pass); fetch failures never do - they surface as error strings on
    /// the result.
    #[tracing::instrument(skip(self), fields(%horse_id))]
    pub async fn sync_horse(&self, horse_id: uuid::Uuid) -> Result<HorseSyncResult, SyncError> {
        let start = Instant::now();
        let horse = store::horse::get(&self.db, horse_id).await?;

        let fetches = self.planned_fetches(&horse);
        tracing::info!(name = %horse.name, fetches = fetches.len(), "syncing horse");

        let ctx = FetchContext::new(Arc::clone(&self.db), self.limiter.clone())
            .for_owner(horse_id);

        let mut handles = Vec::with_capacity(fetches.len());
        for (adapter, identifier, data_type) in fetches {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                let outcome = adapter.fetch(&ctx, &identifier, data_type).await;
                (adapter.source(), outcome)
            }));
        }

        // Settle every fetch; one source's failure never aborts a sibling.
        let mut per_source: Vec<(DataSource, Vec<CandidateRecord>)> = Vec::new();
        let mut delivered: Vec<DataSource> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((source, outcome)) => match outcome {
                    FetchOutcome::Fetched { records, .. } => {
                        if !delivered.contains(&source) {
                            delivered.push(source);
                        }
                        match per_source.iter_mut().find(|(s, _)| *s == source) {
                            Some((_, group)) => group.extend(records),
                            None => per_source.push((source, records)),
                        }
                    }
                    FetchOutcome::Absent(absence) => {
                        if absence.is_failure() {
                            let message = format!("{source}: {absence}");
                            if !errors.contains(&message) {
                                errors.push(message);
                            }
                        }
                    }
                },
                Err(e) => {
                    errors.push(format!("fetch task panic: {e}"));
                }
            }
        }

        // Merge source by source so the counts stay attributable.
        let mut stats = crate::reconcile::ReconcileStats::default();
        for (source, candidates) in &per_source {
            match reconcile::reconcile(&self.db, horse_id, candidates).await {
                Ok(source_stats) => {
                    tracing::debug!(
                        %source,
                        added = source_stats.added,
                        updated = source_stats.updated,
                        unchanged = source_stats.unchanged,
                        "merged source records"
                    );
                    stats.absorb(source_stats);
                }
                Err(e) => {
                    // Best effort: record the failure so the next batch pass
                    // picks the horse up again, then propagate.
                    if let Err(mark_err) = store::horse::update_sync_status(
                        &self.db,
                        horse_id,
                        SyncStatus::Error,
                        Utc::now(),
                    )
                    .await
                    {
                        tracing::error!(error = %mark_err, "failed to record error status");
                    }
                    return Err(e.into());
                }
            }
        }

        let success = errors.is_empty();
        let status = if success {
            SyncStatus::Synced
        } else {
            SyncStatus::Error
        };
        store::horse::update_sync_status(&self.db, horse_id, status, Utc::now()).await?;

        let result = HorseSyncResult {
            horse_id,
            success,
            sources: delivered,
            added: stats.added,
            updated: stats.updated,
            errors,
            duration: start.elapsed(),
        };

        tracing::info!(
            added = result.added,
            updated = result.updated,
            errors = result.errors.len(),
            duration_ms = result.duration.as_millis() as u64,
            "horse sync finished"
        );

        Ok(result)
    }

    /// Run one batch pass over horses due for sync.
    ///
    /// Horses are processed sequentially with a pacing delay between them.
    /// A failing horse is counted and skipped; only the initial selection
    /// query can abort the whole pass.
    #[tracing::instrument(skip(self))]
    pub async fn sync_batch(&self) -> Result<BatchSyncResult, SyncError> {
        let horses = store::horse::list_needing_sync(
            &self.db,
            self.options.staleness_horizon,
            self.options.batch_limit,
        )
        .await?;

        let mut result = BatchSyncResult {
            attempted: horses.len(),
            ..Default::default()
        };

        tracing::info!(horses = horses.len(), "starting batch sync");

        for (i, horse) in horses.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.options.pacing_delay).await;
            }

            match self.sync_horse(horse.id).await {
                Ok(horse_result) => {
                    result.added += horse_result.added;
                    result.updated += horse_result.updated;
                    if horse_result.success {
                        result.synced += 1;
                    } else {
                        result.failed += 1;
                        for error in horse_result.errors {
                            result.errors.push(format!("{}: {}", horse.name, error));
                        }
                    }
                }
                Err(e) => {
                    result.failed += 1;
                    result.errors.push(format!("{}: {}", horse.name, e));
                    tracing::warn!(horse = %horse.name, error = %e, "horse sync failed");
                }
            }
        }

        tracing::info!(
            attempted = result.attempted,
            synced = result.synced,
            failed = result.failed,
            added = result.added,
            "batch sync finished"
        );

        Ok(result)
    }

    /// Refresh marketplace listings for one horse. Used by market refresh
    /// jobs; unlike `sync_horse`, a fetch failure here is an error so the
    /// job can transition to failed with the message retained.
    pub async fn refresh_market(
        &self,
        horse_id: uuid::Uuid,
    ) -> Result<MarketRefreshResult, SyncError> {
        let horse = store::horse::get(&self.db, horse_id).await?;
        let source = DataSource::Ehorses;

        let Some(identifier) = horse.external_id(source).map(String::from) else {
            return Err(SyncError::MissingIdentifier { horse_id, src: source });
        };
        let Some(adapter) = self.adapters.get(&source) else {
            return Err(SyncError::MissingAdapter { src: source });
        };

        let ctx = FetchContext::new(Arc::clone(&self.db), self.limiter.clone())
            .for_owner(horse_id);

        match adapter.fetch(&ctx, &identifier, DataType::SaleListings).await {
            FetchOutcome::Fetched { records, .. } => {
                let stats = reconcile::reconcile(&self.db, horse_id, &records).await?;
                Ok(MarketRefreshResult {
                    found: records.len(),
                    added: stats.added,
                    updated: stats.updated,
                })
            }
            FetchOutcome::Absent(absence) if absence.is_failure() => Err(SyncError::Source {
                src: source,
                message: absence.to_string(),
            }),
            FetchOutcome::Absent(_) => Ok(MarketRefreshResult {
                found: 0,
                added: 0,
                updated: 0,
            }),
        }
    }
}
