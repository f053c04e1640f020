//! Recurring background duties: batch sync, market job creation, queue
//! draining, and retention cleanup.
//!
//! One tokio task per duty. Triggers are computed from wall-clock cadences
//! (no external cron), and every duty is guarded by a run flag: a trigger
//! that fires while the previous run is still in flight is skipped
//! entirely - not queued, not retried early. The guard also covers manual
//! runs from the CLI, so an operator cannot start a batch pass on top of a
//! scheduled one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc, Weekday};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache;
use crate::entity::data_source::DataSource;
use crate::entity::scraping_job::JobType;
use crate::jobs::JobRunner;
use crate::store;
use crate::sync::SyncEngine;

/// When a recurring duty fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Every fixed interval, anchored at startup.
    Every(Duration),
    /// Daily at a fixed UTC hour.
    DailyAt { hour: u32 },
    /// Weekly on a fixed day at a fixed UTC hour.
    WeeklyAt { weekday: Weekday, hour: u32 },
}

impl Cadence {
    /// Time until the next trigger strictly after `now`.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            Cadence::Every(interval) => interval,
            Cadence::DailyAt { hour } => {
                let today = now
                    .date_naive()
                    .and_hms_opt(hour.min(23), 0, 0)
                    .expect("clamped hour is in range")
                    .and_utc();
                let next = if today > now {
                    today
                } else {
                    today + ChronoDuration::days(1)
                };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
            Cadence::WeeklyAt { weekday, hour } => {
                let days_ahead = (weekday.num_days_from_monday() + 7
                    - now.weekday().num_days_from_monday())
                    % 7;
                let candidate = (now.date_naive() + ChronoDuration::days(days_ahead as i64))
                    .and_hms_opt(hour.min(23), 0, 0)
                    .expect("clamped hour is in range")
                    .and_utc();
                let next = if candidate > now {
                    candidate
                } else {
                    candidate + ChronoDuration::days(7)
                };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}

/// Mutual-exclusion flag for one recurring duty.
#[derive(Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

/// Held while a duty runs; releases the guard on drop.
pub struct RunToken {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    /// Claim the guard, or None when a run is already in progress.
    pub fn try_acquire(&self) -> Option<RunToken> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunToken {
                running: Arc::clone(&self.running),
            })
    }
}

impl Drop for RunToken {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Cadences and retention knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Batch sync cadence.
    pub batch_sync: Cadence,
    /// Market refresh job creation cadence.
    pub market_refresh: Cadence,
    /// Job queue draining cadence.
    pub job_drain: Cadence,
    /// Cache/job cleanup cadence.
    pub cleanup: Cadence,
    /// Cache entries expired longer than this are deleted by cleanup.
    pub cache_retention_days: i64,
    /// Finished jobs older than this are deleted by cleanup.
    pub job_retention_days: i64,
    /// Jobs picked up per drain pass.
    pub drain_limit: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_sync: Cadence::Every(Duration::from_secs(6 * 60 * 60)),
            market_refresh: Cadence::DailyAt { hour: 3 },
            job_drain: Cadence::Every(Duration::from_secs(30 * 60)),
            cleanup: Cadence::WeeklyAt {
                weekday: Weekday::Sun,
                hour: 4,
            },
            cache_retention_days: 30,
            job_retention_days: 30,
            drain_limit: 20,
        }
    }
}

/// The background scheduler. Fires recurring duties until shut down.
#[derive(Clone)]
pub struct Scheduler {
    engine: SyncEngine,
    runner: JobRunner,
    config: SchedulerConfig,
    batch_guard: RunGuard,
    market_guard: RunGuard,
    drain_guard: RunGuard,
    cleanup_guard: RunGuard,
}

/// Handle to a started scheduler; shuts the duty tasks down on request.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the duty tasks to exit. Duties mid-run
    /// finish their current run first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "scheduler task ended abnormally");
            }
        }
    }
}

impl Scheduler {
    pub fn new(engine: SyncEngine, config: SchedulerConfig) -> Self {
        let runner = JobRunner::new(engine.clone());
        Self {
            engine,
            runner,
            config,
            batch_guard: RunGuard::default(),
            market_guard: RunGuard::default(),
            drain_guard: RunGuard::default(),
            cleanup_guard: RunGuard::default(),
        }
    }

    /// Run the batch sync duty now. Returns false when a run was already in
    /// progress and this trigger was skipped.
    pub async fn run_batch_sync(&self) -> bool {
        let Some(_token) = self.batch_guard.try_acquire() else {
            tracing::warn!("batch sync already running, skipping trigger");
            return false;
        };
        match self.engine.sync_batch().await {
            Ok(result) => tracing::info!(
                attempted = result.attempted,
                synced = result.synced,
                failed = result.failed,
                "scheduled batch sync finished"
            ),
            Err(e) => tracing::error!(error = %e, "scheduled batch sync aborted"),
        }
        true
    }

    /// Create market refresh jobs for every horse with a marketplace id.
    /// This is how recurring market scrapes are re-armed: fresh pending
    /// rows per day, never a reset of a finished row.
    pub async fn run_market_refresh(&self) -> bool {
        let Some(_token) = self.market_guard.try_acquire() else {
            tracing::warn!("market refresh already running, skipping trigger");
            return false;
        };

        let db = self.engine.db();
        match store::horse::list_with_market_ids(db).await {
            Ok(horses) => {
                let mut created = 0usize;
                for horse in horses {
                    let params = serde_json::json!({ "horse_id": horse.id.to_string() });
                    match store::job::ensure_pending(
                        db,
                        JobType::MarketRefresh,
                        DataSource::Ehorses,
                        params,
                        Some("daily"),
                    )
                    .await
                    {
                        Ok(Some(_)) => created += 1,
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(horse = %horse.name, error = %e, "failed to enqueue market job")
                        }
                    }
                }
                tracing::info!(created, "market refresh jobs armed");
            }
            Err(e) => tracing::error!(error = %e, "market refresh job creation aborted"),
        }
        true
    }

    /// Drain due pending jobs now.
    pub async fn run_job_drain(&self) -> bool {
        let Some(_token) = self.drain_guard.try_acquire() else {
            tracing::warn!("job drain already running, skipping trigger");
            return false;
        };
        match self.runner.drain_due(self.config.drain_limit).await {
            Ok(summary) => tracing::info!(
                picked = summary.picked,
                completed = summary.completed,
                failed = summary.failed,
                "job drain finished"
            ),
            Err(e) => tracing::error!(error = %e, "job drain aborted"),
        }
        true
    }

    /// Run retention cleanup now: old cache entries and finished jobs.
    pub async fn run_cleanup(&self) -> bool {
        let Some(_token) = self.cleanup_guard.try_acquire() else {
            tracing::warn!("cleanup already running, skipping trigger");
            return false;
        };

        let db = self.engine.db();
        match cache::cleanup(db, self.config.cache_retention_days).await {
            Ok(removed) => tracing::info!(removed, "cache cleanup finished"),
            Err(e) => tracing::error!(error = %e, "cache cleanup failed"),
        }

        let cutoff = Utc::now() - ChronoDuration::days(self.config.job_retention_days);
        match store::job::prune_finished(db, cutoff).await {
            Ok(removed) => tracing::info!(removed, "job cleanup finished"),
            Err(e) => tracing::error!(error = %e, "job cleanup failed"),
        }
        true
    }

    /// Start the duty tasks. The returned handle stops them.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tasks = vec![
            self.spawn_duty("batch_sync", self.config.batch_sync, shutdown_rx.clone(), {
                let scheduler = self.clone();
                move || {
                    let scheduler = scheduler.clone();
                    async move {
                        scheduler.run_batch_sync().await;
                    }
                }
            }),
            self.spawn_duty(
                "market_refresh",
                self.config.market_refresh,
                shutdown_rx.clone(),
                {
                    let scheduler = self.clone();
                    move || {
                        let scheduler = scheduler.clone();
                        async move {
                            scheduler.run_market_refresh().await;
                        }
                    }
                },
            ),
            self.spawn_duty("job_drain", self.config.job_drain, shutdown_rx.clone(), {
                let scheduler = self.clone();
                move || {
                    let scheduler = scheduler.clone();
                    async move {
                        scheduler.run_job_drain().await;
                    }
                }
            }),
            self.spawn_duty("cleanup", self.config.cleanup, shutdown_rx, {
                let scheduler = self.clone();
                move || {
                    let scheduler = scheduler.clone();
                    async move {
                        scheduler.run_cleanup().await;
                    }
                }
            }),
        ];

        SchedulerHandle { shutdown_tx, tasks }
    }

    fn spawn_duty<F, Fut>(
        &self,
        name: &'static str,
        cadence: Cadence,
        mut shutdown_rx: watch::Receiver<bool>,
        run: F,
    ) -> JoinHandle<()>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            loop {
                let delay = cadence.next_delay(Utc::now());
                tracing::debug!(duty = name, delay_secs = delay.as_secs(), "duty sleeping");

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        run().await;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::debug!(duty = name, "duty shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_every_cadence_is_the_interval() {
        let cadence = Cadence::Every(Duration::from_secs(1800));
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap();
        assert_eq!(cadence.next_delay(now), Duration::from_secs(1800));
    }

    #[test]
    fn test_daily_cadence_before_and_after_the_hour() {
        let cadence = Cadence::DailyAt { hour: 3 };

        let before = Utc.with_ymd_and_hms(2026, 8, 5, 1, 0, 0).unwrap();
        assert_eq!(cadence.next_delay(before), Duration::from_secs(2 * 3600));

        let after = Utc.with_ymd_and_hms(2026, 8, 5, 4, 0, 0).unwrap();
        assert_eq!(cadence.next_delay(after), Duration::from_secs(23 * 3600));

        // Exactly at the trigger: next one is tomorrow.
        let exact = Utc.with_ymd_and_hms(2026, 8, 5, 3, 0, 0).unwrap();
        assert_eq!(cadence.next_delay(exact), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_weekly_cadence_targets_the_right_day() {
        let cadence = Cadence::WeeklyAt {
            weekday: Weekday::Sun,
            hour: 4,
        };

        // 2026-08-05 is a Wednesday; Sunday 04:00 is 3 days 18h later.
        let wednesday = Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap();
        assert_eq!(
            cadence.next_delay(wednesday),
            Duration::from_secs((3 * 24 + 18) * 3600)
        );

        // Sunday after the hour: a full week minus the overshoot.
        let sunday_late = Utc.with_ymd_and_hms(2026, 8, 9, 5, 0, 0).unwrap();
        assert_eq!(
            cadence.next_delay(sunday_late),
            Duration::from_secs((7 * 24 - 1) * 3600)
        );
    }

    #[test]
    fn test_run_guard_excludes_concurrent_runs() {
        let guard = RunGuard::default();

        let token = guard.try_acquire().expect("first acquire succeeds");
        assert!(
            guard.try_acquire().is_none(),
            "second acquire is refused while the first run is in flight"
        );

        drop(token);
        assert!(guard.try_acquire().is_some(), "guard frees on drop");
    }

    mod duties {
        use std::sync::Arc;

        use sea_orm::Set;

        use super::*;
        use crate::db::connect_and_migrate;
        use crate::rate_limit::SourceRateLimiter;
        use crate::store::horse;
        use crate::sync::{SyncEngine, SyncOptions};

        async fn scheduler() -> Scheduler {
            let db = Arc::new(
                connect_and_migrate("sqlite::memory:")
                    .await
                    .expect("test db should migrate"),
            );
            let engine = SyncEngine::new(
                db,
                SourceRateLimiter::new(),
                Vec::new(),
                SyncOptions::default(),
            );
            Scheduler::new(engine, SchedulerConfig::default())
        }

        #[tokio::test]
        async fn market_refresh_arms_one_job_per_marketed_horse() {
            let scheduler = scheduler().await;
            let db = scheduler.engine.db();

            let mut listed = horse::new_horse("Listed");
            listed.ehorses_id = Set(Some("778812".to_string()));
            horse::insert(db, listed).await.unwrap();
            horse::insert(db, horse::new_horse("Unlisted")).await.unwrap();

            assert!(scheduler.run_market_refresh().await);

            let jobs = store::job::list_recent(db, 10).await.unwrap();
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].job_type, JobType::MarketRefresh);
            assert!(jobs[0].is_recurring);

            // Re-running the duty does not stack duplicate pending jobs.
            assert!(scheduler.run_market_refresh().await);
            assert_eq!(store::job::list_recent(db, 10).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn duty_trigger_is_skipped_while_a_run_is_in_flight() {
            let scheduler = scheduler().await;

            let _token = scheduler.batch_guard.try_acquire().unwrap();
            assert!(
                !scheduler.run_batch_sync().await,
                "trigger must be skipped, not queued"
            );

            drop(_token);
            assert!(scheduler.run_batch_sync().await);
        }

        #[tokio::test]
        async fn cleanup_runs_both_retention_passes() {
            let scheduler = scheduler().await;
            // Empty database: the duty just needs to run through cleanly.
            assert!(scheduler.run_cleanup().await);
        }

        #[tokio::test]
        async fn started_scheduler_shuts_down_cleanly() {
            let scheduler = scheduler().await;
            let handle = scheduler.start();
            handle.shutdown().await;
        }
    }
}
