//! ehorses page fetcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::entity::data_source::DataSource;
use crate::entity::fetch_cache::DataType;
use crate::http::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::source::{
    fetch_through_cache, into_found, send_request, CandidateRecord, FetchContext, FetchOutcome,
    FetchResult, SourceAdapter, SourceError, CALL_TIMEOUT,
};

use super::convert::listings_to_candidates;

/// Default ehorses host.
pub const DEFAULT_HOST: &str = "https://www.ehorses.com";

/// ehorses marketplace client.
#[derive(Clone)]
pub struct EhorsesClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    timeout: Duration,
}

impl EhorsesClient {
    /// Create a client against the default host. The marketplace needs no
    /// authentication for listing pages.
    pub fn new() -> Self {
        Self::new_with_transport(DEFAULT_HOST, Arc::new(ReqwestTransport::default()))
    }

    /// Create a client with an explicit host and transport.
    pub fn new_with_transport(host: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            timeout: CALL_TIMEOUT,
        }
    }

    fn listings_url(&self, seller_id: &str) -> Result<String, SourceError> {
        let url = Url::parse(&format!("{}/sellers/{}/horses", self.host, seller_id))
            .map_err(|e| SourceError::parse(format!("bad listings url: {e}")))?;
        Ok(url.into())
    }

    async fn fetch_listings(&self, seller_id: &str) -> FetchResult<Vec<CandidateRecord>> {
        let url = self.listings_url(seller_id)?;
        let request = HttpRequest::get_html(&url);
        let response = send_request(self.transport.as_ref(), request, self.timeout).await?;
        let Some(response) = into_found(response)? else {
            return Ok(None);
        };
        Ok(Some(listings_to_candidates(&response.body_text())?))
    }
}

impl Default for EhorsesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for EhorsesClient {
    fn source(&self) -> DataSource {
        DataSource::Ehorses
    }

    fn supports(&self, data_type: DataType) -> bool {
        matches!(data_type, DataType::SaleListings)
    }

    async fn fetch(
        &self,
        ctx: &FetchContext,
        identifier: &str,
        data_type: DataType,
    ) -> FetchOutcome {
        match data_type {
            DataType::SaleListings => {
                fetch_through_cache(ctx, self.source(), identifier, data_type, || {
                    self.fetch_listings(identifier)
                })
                .await
            }
            other => {
                tracing::warn!(data_type = %other, "ehorses adapter asked for unsupported data type");
                FetchOutcome::Absent(crate::source::Absence::NoData)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;
    use crate::http::{HttpMethod, MockTransport};
    use crate::rate_limit::SourceRateLimiter;
    use crate::source::Absence;

    const HOST: &str = "https://ehorses.test";

    async fn ctx() -> FetchContext {
        let db = Arc::new(
            connect_and_migrate("sqlite::memory:")
                .await
                .expect("test db should migrate"),
        );
        FetchContext::new(db, SourceRateLimiter::new())
    }

    fn client(transport: &MockTransport) -> EhorsesClient {
        EhorsesClient::new_with_transport(HOST, Arc::new(transport.clone()))
    }

    #[tokio::test]
    async fn fetch_listings_parses_page_into_sale_entries() {
        let transport = MockTransport::new();
        transport.push_ok(
            HttpMethod::Get,
            format!("{HOST}/sellers/778812/horses"),
            r#"
            <div class="listing" data-listing-id="778812-3">
              <h3 class="listing-title">Cornet's Dream</h3>
              <span class="listing-price">€ 85.000</span>
              <time class="listing-date" datetime="2026-06-01">1 June 2026</time>
            </div>
            "#,
        );

        let ctx = ctx().await;
        let outcome = client(&transport)
            .fetch(&ctx, "778812", DataType::SaleListings)
            .await;

        let records = outcome.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_id.as_deref(), Some("778812-3"));
        assert_eq!(records[0].metadata["price_eur"], 85000);
    }

    #[tokio::test]
    async fn unknown_seller_is_no_data() {
        let transport = MockTransport::new();
        transport.push_status(HttpMethod::Get, format!("{HOST}/sellers/0/horses"), 404);

        let ctx = ctx().await;
        let outcome = client(&transport)
            .fetch(&ctx, "0", DataType::SaleListings)
            .await;

        assert!(matches!(outcome, FetchOutcome::Absent(Absence::NoData)));
    }

    #[tokio::test]
    async fn broken_markup_is_absorbed_as_parse_absence() {
        let transport = MockTransport::new();
        transport.push_ok(
            HttpMethod::Get,
            format!("{HOST}/sellers/778812/horses"),
            r#"<div class="listing" data-listing-id="778812-3"></div>"#,
        );

        let ctx = ctx().await;
        let outcome = client(&transport)
            .fetch(&ctx, "778812", DataType::SaleListings)
            .await;

        match outcome {
            FetchOutcome::Absent(Absence::Parse(_)) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
