//! Source adapters: uniform fetch access to external registries.
//!
//! Every provider implements [`SourceAdapter`]; the differences between
//! providers are confined to request building, response mapping, and TTL
//! choice. Caching, throttling, per-call timeouts, and failure absorption
//! all live in the shared [`fetch_through_cache`] pipeline, so no adapter
//! can forget them.

pub mod ehorses;
mod errors;
pub mod fei;
pub mod horsetelex;
mod types;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache;
use crate::entity::data_source::DataSource;
use crate::entity::fetch_cache::DataType;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};

pub use errors::{FetchResult, SourceError};
pub use types::{Absence, CandidateRecord, FetchContext, FetchOutcome};

/// Per-call timeout applied to every outbound provider request.
///
/// A call that outlives this resolves to "no data", never to an error that
/// could fail a sync.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(20);

/// Uniform fetch contract every provider adapter implements.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The source this adapter talks to.
    fn source(&self) -> DataSource;

    /// Whether the adapter serves this kind of data.
    fn supports(&self, data_type: DataType) -> bool;

    /// Fetch `data_type` for the provider-side `identifier`.
    ///
    /// Never errors: network, timeout, and parse failures are absorbed into
    /// [`FetchOutcome::Absent`] after being logged.
    async fn fetch(
        &self,
        ctx: &FetchContext,
        identifier: &str,
        data_type: DataType,
    ) -> FetchOutcome;
}

/// The shared fetch pipeline behind every adapter.
///
/// 1. Cache lookup - a hit is returned immediately, stale or not.
/// 2. On a miss, acquire the source's rate-limit slot.
/// 3. Run the provider call (already bounded by [`CALL_TIMEOUT`] via
///    [`send_request`]).
/// 4. Cache the normalized records under the data type's TTL.
/// 5. Absorb any failure into a logged absence.
///
/// Data types with no TTL (live results) skip the cache on both ends.
pub(crate) async fn fetch_through_cache<F, Fut>(
    ctx: &FetchContext,
    source: DataSource,
    identifier: &str,
    data_type: DataType,
    call: F,
) -> FetchOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = FetchResult<Vec<CandidateRecord>>>,
{
    let ttl = data_type.ttl();

    if ttl.is_some() {
        match cache::get(ctx.db.as_ref(), source, identifier, data_type).await {
            Ok(Some(entry)) => {
                match serde_json::from_value::<Vec<CandidateRecord>>(entry.payload) {
                    Ok(records) => {
                        tracing::debug!(
                            %source,
                            identifier,
                            %data_type,
                            stale = entry.is_stale,
                            "serving records from fetch cache"
                        );
                        return FetchOutcome::Fetched {
                            records,
                            from_cache: true,
                            stale: entry.is_stale,
                        };
                    }
                    Err(e) => {
                        // A payload written by an older build; refetch.
                        tracing::warn!(
                            %source,
                            identifier,
                            %data_type,
                            error = %e,
                            "cached payload no longer deserializes, refetching"
                        );
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(%source, identifier, %data_type, error = %e, "cache read failed, falling through to fetch");
            }
        }
    }

    ctx.limiter.acquire(source).await;

    match call().await {
        Ok(Some(records)) => {
            if let Some(ttl) = ttl {
                let payload = match serde_json::to_value(&records) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(%source, identifier, %data_type, error = %e, "failed to serialize records for caching");
                        serde_json::Value::Null
                    }
                };
                if payload != serde_json::Value::Null {
                    if let Err(e) = cache::set(
                        ctx.db.as_ref(),
                        source,
                        identifier,
                        data_type,
                        payload,
                        ttl,
                        ctx.owner,
                    )
                    .await
                    {
                        // A lost cache write only costs a refetch later.
                        tracing::warn!(%source, identifier, %data_type, error = %e, "cache write failed");
                    }
                }
            }
            FetchOutcome::Fetched {
                records,
                from_cache: false,
                stale: false,
            }
        }
        Ok(None) => {
            tracing::debug!(%source, identifier, %data_type, "source has no data");
            FetchOutcome::Absent(Absence::NoData)
        }
        Err(e) => {
            tracing::warn!(%source, identifier, %data_type, error = %e, "fetch failed, absorbing as absent");
            FetchOutcome::Absent(e.into())
        }
    }
}

/// Send a request through the transport under the per-call timeout.
pub(crate) async fn send_request(
    transport: &dyn HttpTransport,
    request: HttpRequest,
    timeout: Duration,
) -> Result<HttpResponse, SourceError> {
    match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(SourceError::network(e.to_string())),
        Err(_) => Err(SourceError::Timeout),
    }
}

/// Interpret a response status: 404 means "no data", other non-2xx are
/// errors, 2xx passes the response through.
pub(crate) fn into_found(response: HttpResponse) -> FetchResult<HttpResponse> {
    match response.status {
        200..=299 => Ok(Some(response)),
        404 => Ok(None),
        status => Err(SourceError::Status { status }),
    }
}
