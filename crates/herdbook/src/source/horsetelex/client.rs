//! HorseTelex API client.

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

use super::convert::{indices_to_candidates, pedigree_to_candidates};
use super::types::{TelexIndices, TelexPedigree};

/// Default HorseTelex API host.
pub const DEFAULT_HOST: &str = "https://api.horsetelex.com/v2";

/// HorseTelex API client.
#[derive(Clone)]
pub struct HorsetelexClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    token: String,
    timeout: Duration,
}

impl HorsetelexClient {
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

    async fn fetch_pedigree(&self, id: &str) -> FetchResult<Vec<CandidateRecord>> {
        let Some(pedigree) = self
            .get_json::<TelexPedigree>(&format!("/horses/{id}/pedigree"))
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(pedigree_to_candidates(&pedigree)?))
    }

    async fn fetch_indices(&self, id: &str) -> FetchResult<Vec<CandidateRecord>> {
        let Some(indices) = self
            .get_json::<TelexIndices>(&format!("/horses/{id}/indices"))
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(indices_to_candidates(&indices)?))
    }
}

#[async_trait]
impl SourceAdapter for HorsetelexClient {
    fn source(&self) -> DataSource {
        DataSource::Horsetelex
    }

    fn supports(&self, data_type: DataType) -> bool {
        matches!(data_type, DataType::Pedigree | DataType::Indices)
    }

    async fn fetch(
        &self,
        ctx: &FetchContext,
        identifier: &str,
        data_type: DataType,
    ) -> FetchOutcome {
        match data_type {
            DataType::Pedigree => {
                fetch_through_cache(ctx, self.source(), identifier, data_type, || {
                    self.fetch_pedigree(identifier)
                })
                .await
            }
            DataType::Indices => {
                fetch_through_cache(ctx, self.source(), identifier, data_type, || {
                    self.fetch_indices(identifier)
                })
                .await
            }
            other => {
                tracing::warn!(data_type = %other, "horsetelex adapter asked for unsupported data type");
                FetchOutcome::Absent(crate::source::Absence::NoData)
            }
        }
    }
}
