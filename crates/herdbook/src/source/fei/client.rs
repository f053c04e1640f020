//! FEI data API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::entity::data_source::DataSource;
use crate::entity::fetch_cache::DataType;
use crate::http::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::source::{
    fetch_through_cache, into_found, send_request, CandidateRecord, FetchContext, FetchOutcome,
    FetchResult, SourceAdapter, SourceError, CALL_TIMEOUT,
};

use super::convert::{profile_to_candidates, results_to_candidates};
use super::types::{FeiHorse, FeiResult};

/// Default FEI data API host.
pub const DEFAULT_HOST: &str = "https://data.fei.org/api/v1";

/// FEI data API client.
#[derive(Clone)]
pub struct FeiClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    token: String,
    timeout: Duration,
}

impl FeiClient {
    /// Create a client against the default host.
    pub fn new(token: &str) -> Self {
        Self::new_with_transport(DEFAULT_HOST, token, Arc::new(ReqwestTransport::default()))
    }

    /// Create a client with an explicit host and transport.
    pub fn new_with_transport(
        host: &str,
        token: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout: CALL_TIMEOUT,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FetchResult<T> {
        let url = format!("{}{}", self.host, path);
        let request = HttpRequest::get_json(&url, Some(&self.token));
        let response = send_request(self.transport.as_ref(), request, self.timeout).await?;
        let Some(response) = into_found(response)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_slice(&response.body)
            .map_err(|e| SourceError::parse(e.to_string()))?;
        Ok(Some(parsed))
    }

    async fn fetch_profile(&self, fei_id: &str) -> FetchResult<Vec<CandidateRecord>> {
        let Some(horse) = self.get_json::<FeiHorse>(&format!("/horses/{fei_id}")).await? else {
            return Ok(None);
        };
        Ok(Some(profile_to_candidates(&horse)?))
    }

    async fn fetch_results(&self, fei_id: &str, live: bool) -> FetchResult<Vec<CandidateRecord>> {
        let path = if live {
            format!("/horses/{fei_id}/results/live")
        } else {
            format!("/horses/{fei_id}/results")
        };
        let Some(results) = self.get_json::<Vec<FeiResult>>(&path).await? else {
            return Ok(None);
        };
        Ok(Some(results_to_candidates(&results)?))
    }
}

#[async_trait]
impl SourceAdapter for FeiClient {
    fn source(&self) -> DataSource {
        DataSource::Fei
    }

    fn supports(&self, data_type: DataType) -> bool {
        matches!(
            data_type,
            DataType::Profile | DataType::Competitions | DataType::LiveResults
        )
    }

    async fn fetch(
        &self,
        ctx: &FetchContext,
        identifier: &str,
        data_type: DataType,
    ) -> FetchOutcome {
        match data_type {
            DataType::Profile => {
                fetch_through_cache(ctx, self.source(), identifier, data_type, || {
                    self.fetch_profile(identifier)
                })
                .await
            }
            DataType::Competitions => {
                fetch_through_cache(ctx, self.source(), identifier, data_type, || {
                    self.fetch_results(identifier, false)
                })
                .await
            }
            DataType::LiveResults => {
                fetch_through_cache(ctx, self.source(), identifier, data_type, || {
                    self.fetch_results(identifier, true)
                })
                .await
            }
            other => {
                tracing::warn!(data_type = %other, "fei adapter asked for unsupported data type");
                FetchOutcome::Absent(crate::source::Absence::NoData)
            }
        }
    }
}
