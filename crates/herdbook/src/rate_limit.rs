//! Per-source sliding-window rate limiting for outbound external calls.
//!
//! Every adapter request passes through [`SourceRateLimiter::acquire`]
//! before touching the network. The limiter never rejects: a caller over
//! quota is suspended until the oldest request in the trailing window ages
//! out, then re-evaluated.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::entity::data_source::DataSource;

/// Length of the sliding window the quotas apply to.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Default per-source quotas (granted acquisitions per sliding 60 s window).
pub mod quotas {
    /// FEI: the public data API documents 120/min for authenticated
    /// clients; stay at half of that.
    pub const FEI_PER_MINUTE: u32 = 60;
    /// HorseTelex: no published limit, conservative default.
    pub const HORSETELEX_PER_MINUTE: u32 = 30;
    /// ehorses is scraped, not an API; keep the footprint polite.
    pub const EHORSES_PER_MINUTE: u32 = 10;
}

/// Default quota for a source.
pub fn default_quota(source: DataSource) -> u32 {
    match source {
        DataSource::Fei => quotas::FEI_PER_MINUTE,
        DataSource::Horsetelex => quotas::HORSETELEX_PER_MINUTE,
        DataSource::Ehorses => quotas::EHORSES_PER_MINUTE,
    }
}

struct Inner {
    quotas: HashMap<DataSource, u32>,
    windows: Mutex<HashMap<DataSource, VecDeque<Instant>>>,
}

/// Sliding-window rate limiter keyed by source.
///
/// Cheap to clone; clones share the same windows. The per-source timestamp
/// lists are guarded by a single mutex that is only held for pruning and
/// bookkeeping, never across an await, so concurrent fetches for different
/// horses can acquire simultaneously without blocking each other beyond
/// their own source's quota.
#[derive(Clone)]
pub struct SourceRateLimiter {
    inner: Arc<Inner>,
}

impl SourceRateLimiter {
    /// Create a limiter with the default per-source quotas.
    pub fn new() -> Self {
        Self::with_quotas(
            DataSource::ALL
                .iter()
                .map(|&source| (source, default_quota(source)))
                .collect(),
        )
    }

    /// Create a limiter with explicit quotas. Sources missing from the map
    /// fall back to their default quota. A quota of 0 is treated as 1.
    pub fn with_quotas(quotas: HashMap<DataSource, u32>) -> Self {
        Self {
            inner: Arc::new(Inner {
                quotas,
                windows: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn quota(&self, source: DataSource) -> u32 {
        self.inner
            .quotas
            .get(&source)
            .copied()
            .unwrap_or_else(|| default_quota(source))
            .max(1)
    }

    /// Wait until a request against `source` is within quota, then record it.
    ///
    /// Guarantee: for any source, no sliding 60-second interval ever
    /// contains more than quota(source) granted acquisitions. Unrelated
    /// sources never delay each other.
    pub async fn acquire(&self, source: DataSource) {
        let quota = self.quota(source) as usize;

        loop {
            let wait = {
                let mut windows = self
                    .inner
                    .windows
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let window = windows.entry(source).or_default();

                let now = Instant::now();
                while let Some(&oldest) = window.front() {
                    if now.duration_since(oldest) >= WINDOW {
                        window.pop_front();
                    } else {
                        break;
                    }
                }

                if window.len() < quota {
                    window.push_back(now);
                    return;
                }

                // Oldest stamp exits the window after this long. Re-check
                // rather than assume the slot is still free: another caller
                // may claim it while we sleep.
                let oldest = *window.front().expect("window at quota is non-empty");
                WINDOW - now.duration_since(oldest)
            };

            tracing::trace!(%source, wait_ms = wait.as_millis() as u64, "rate limit window full, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of grants currently inside `source`'s trailing window.
    /// Intended for operational introspection (CLI `limits`-style output).
    pub fn in_flight(&self, source: DataSource) -> usize {
        let mut windows = self
            .inner
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let window = windows.entry(source).or_default();
        let now = Instant::now();
        window.retain(|&stamp| now.duration_since(stamp) < WINDOW);
        window.len()
    }
}

impl Default for SourceRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter_with(source: DataSource, quota: u32) -> SourceRateLimiter {
        let mut quotas = HashMap::new();
        quotas.insert(source, quota);
        SourceRateLimiter::with_quotas(quotas)
    }

    #[tokio::test(start_paused = true)]
    async fn grants_up_to_quota_without_waiting() {
        let limiter = limiter_with(DataSource::Fei, 3);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire(DataSource::Fei).await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_flight(DataSource::Fei), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_acquisition_over_quota_until_window_frees() {
        let limiter = limiter_with(DataSource::Fei, 2);
        let start = Instant::now();

        limiter.acquire(DataSource::Fei).await;
        limiter.acquire(DataSource::Fei).await;
        // Third acquisition must wait the full window (both stamps are at t=0).
        limiter.acquire(DataSource::Fei).await;

        assert!(
            start.elapsed() >= WINDOW,
            "third grant arrived after {:?}",
            start.elapsed()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_sliding_window_exceeds_quota() {
        const QUOTA: u32 = 4;
        let limiter = limiter_with(DataSource::Fei, QUOTA);

        let mut grant_times = Vec::new();
        for _ in 0..10 {
            limiter.acquire(DataSource::Fei).await;
            grant_times.push(Instant::now());
            tokio::time::advance(Duration::from_secs(5)).await;
        }

        for (i, &t) in grant_times.iter().enumerate() {
            let in_window = grant_times[i..]
                .iter()
                .take_while(|&&u| u.duration_since(t) < WINDOW)
                .count();
            assert!(
                in_window <= QUOTA as usize,
                "window starting at grant {i} holds {in_window} grants"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sources_do_not_block_each_other() {
        let mut quotas = HashMap::new();
        quotas.insert(DataSource::Fei, 1);
        quotas.insert(DataSource::Horsetelex, 1);
        let limiter = SourceRateLimiter::with_quotas(quotas);

        let start = Instant::now();
        limiter.acquire(DataSource::Fei).await;
        // Fei is now exhausted; Horsetelex must still be granted instantly.
        limiter.acquire(DataSource::Horsetelex).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquirers_are_all_eventually_granted() {
        let limiter = limiter_with(DataSource::Ehorses, 2);

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire(DataSource::Ehorses).await;
                Instant::now()
            }));
        }

        let mut grant_times = Vec::new();
        for handle in handles {
            grant_times.push(handle.await.expect("acquirer should not panic"));
        }

        grant_times.sort();
        // 6 grants at quota 2/window need at least two full window waits.
        let spread = grant_times[5].duration_since(grant_times[0]);
        assert!(spread >= WINDOW * 2, "grants spread only {spread:?}");
    }

    #[test]
    fn zero_quota_is_clamped_to_one() {
        let limiter = limiter_with(DataSource::Fei, 0);
        assert_eq!(limiter.quota(DataSource::Fei), 1);
    }

    #[test]
    fn missing_source_falls_back_to_default_quota() {
        let limiter = limiter_with(DataSource::Fei, 5);
        assert_eq!(
            limiter.quota(DataSource::Ehorses),
            quotas::EHORSES_PER_MINUTE
        );
    }
}
