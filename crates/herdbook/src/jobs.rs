//! Execution of queued scraping jobs.
//!
//! A drain pass picks up due pending jobs, walks each through
//! pending → running → completed | failed, and never re-executes a job
//! another pass already claimed. Failures keep their error message on the
//! row for diagnosis; nothing is retried in place - recurring work is
//! re-armed by the scheduler as fresh rows.

use chrono::Utc;

use crate::entity::scraping_job::{JobType, Model as JobModel};
use crate::store::{self, StoreError};
use crate::sync::SyncEngine;

/// Summary of one drain pass.
#[derive(Debug, Default)]
pub struct DrainSummary {
    /// Jobs picked up by this pass.
    pub picked: usize,
    /// Jobs that completed.
    pub completed: usize,
    /// Jobs that failed.
    pub failed: usize,
}

/// Executes queued scraping jobs against the sync engine.
#[derive(Clone)]
pub struct JobRunner {
    engine: SyncEngine,
}

impl JobRunner {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Pick up and execute due pending jobs, at most `limit` of them.
    ///
    /// Only the selection query can fail the pass; individual job failures
    /// are recorded on their rows and counted.
    pub async fn drain_due(&self, limit: u64) -> Result<DrainSummary, StoreError> {
        let db = self.engine.db();
        let due = store::job::list_due(db, Utc::now(), limit).await?;

        let mut summary = DrainSummary {
            picked: due.len(),
            ..Default::default()
        };

        for job in due {
            // A concurrent drain pass may have claimed the job between the
            // listing and here; losing that race is not an error.
            if let Err(e) = store::job::mark_running(db, job.id).await {
                tracing::debug!(job = %job.id, error = %e, "job already claimed, skipping");
                summary.picked -= 1;
                continue;
            }

            match self.execute(&job).await {
                Ok((found, processed, result)) => {
                    store::job::mark_completed(db, job.id, found, processed, result).await?;
                    summary.completed += 1;
                    tracing::info!(job = %job.id, job_type = %job.job_type, found, processed, "job completed");
                }
                Err(e) => {
                    store::job::mark_failed(db, job.id, &e).await?;
                    summary.failed += 1;
                    tracing::warn!(job = %job.id, job_type = %job.job_type, error = %e, "job failed");
                }
            }
        }

        Ok(summary)
    }

    /// Run one job, returning (items_found, items_processed, result payload)
    /// or the error message to retain on the row.
    async fn execute(&self, job: &JobModel) -> Result<(i32, i32, serde_json::Value), String> {
        let horse_id = job
            .horse_id()
            .ok_or_else(|| format!("job params carry no horse_id: {}", job.params))?;

        match job.job_type {
            JobType::MarketRefresh => {
                let result = self
                    .engine
                    .refresh_market(horse_id)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok((
                    result.found as i32,
                    (result.added + result.updated) as i32,
                    serde_json::json!({
                        "added": result.added,
                        "updated": result.updated,
                    }),
                ))
            }
            JobType::HorseRefresh => {
                let result = self
                    .engine
                    .sync_horse(horse_id)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok((
                    (result.added + result.updated) as i32,
                    (result.added + result.updated) as i32,
                    serde_json::json!({
                        "added": result.added,
                        "updated": result.updated,
                        "sources": result.sources,
                        "errors": result.errors,
                    }),
                ))
            }
        }
    }
}
