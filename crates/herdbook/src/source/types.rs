//! Shared adapter types: the canonical record shape and fetch outcomes.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::data_source::DataSource;
use crate::entity::timeline_entry::EntryType;
use crate::rate_limit::SourceRateLimiter;

/// The canonical record shape every adapter normalizes into.
///
/// One candidate becomes (at most) one timeline entry after reconciliation.
/// The `metadata` carries the type-specific payload the dedup/merge logic
/// compares: rank and score for competitions, partner for breeding and
/// ownership, price for sales, index values for indices updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Kind of timeline event this candidate represents.
    pub entry_type: EntryType,
    /// Date the event took place.
    pub entry_date: NaiveDate,
    /// Short headline.
    pub title: String,
    /// Longer free-form description.
    pub description: Option<String>,
    /// The source that produced the candidate.
    pub source: DataSource,
    /// The provider's own identifier for the event, when it has one.
    pub source_id: Option<String>,
    /// Type-specific structured payload.
    pub metadata: serde_json::Value,
}

impl CandidateRecord {
    /// The partner identifier carried in metadata for ownership/breeding
    /// candidates, if present.
    pub fn partner(&self) -> Option<&str> {
        self.metadata.get("partner").and_then(|v| v.as_str())
    }
}

/// Why an adapter produced no records.
///
/// `NoData` is a normal outcome (the provider does not know the identifier);
/// the other variants are absorbed failures that surface as per-source error
/// strings on the sync result without ever failing a sibling source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absence {
    /// The provider has no data for the identifier.
    NoData,
    /// The per-call timeout elapsed.
    Timeout,
    /// Transport-level failure.
    Network(String),
    /// Malformed provider response.
    Parse(String),
}

impl Absence {
    /// Whether this absence should be reported as a per-source error.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Absence::NoData)
    }
}

impl std::fmt::Display for Absence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Absence::NoData => write!(f, "no data"),
            Absence::Timeout => write!(f, "timeout"),
            Absence::Network(msg) => write!(f, "network error: {msg}"),
            Absence::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl From<super::errors::SourceError> for Absence {
    fn from(err: super::errors::SourceError) -> Self {
        use super::errors::SourceError;
        match err {
            SourceError::Timeout => Absence::Timeout,
            SourceError::Network(msg) => Absence::Network(msg),
            SourceError::Status { status } => Absence::Network(format!("status {status}")),
            SourceError::Parse(msg) => Absence::Parse(msg),
        }
    }
}

/// Outcome of one adapter fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Normalized records were obtained, possibly from the cache.
    Fetched {
        records: Vec<CandidateRecord>,
        /// Whether the records came out of the fetch cache.
        from_cache: bool,
        /// Whether the cached records were past their TTL when served.
        stale: bool,
    },
    /// No records; see [`Absence`] for whether that is an error.
    Absent(Absence),
}

impl FetchOutcome {
    /// The fetched records, or an empty slice for an absent outcome.
    pub fn records(&self) -> &[CandidateRecord] {
        match self {
            FetchOutcome::Fetched { records, .. } => records,
            FetchOutcome::Absent(_) => &[],
        }
    }

    /// The absorbed failure, if the outcome is a failing absence.
    pub fn failure(&self) -> Option<&Absence> {
        match self {
            FetchOutcome::Absent(absence) if absence.is_failure() => Some(absence),
            _ => None,
        }
    }

    /// Whether any records were obtained.
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }
}

/// Shared dependencies every adapter fetch runs with.
///
/// Cloneable so concurrent per-source fetch tasks can each own one.
#[derive(Clone)]
pub struct FetchContext {
    /// Durable store holding the fetch cache.
    pub db: Arc<DatabaseConnection>,
    /// Shared per-source rate limiter.
    pub limiter: SourceRateLimiter,
    /// The horse the fetch is on behalf of, recorded as the cache owner.
    pub owner: Option<Uuid>,
}

impl FetchContext {
    pub fn new(db: Arc<DatabaseConnection>, limiter: SourceRateLimiter) -> Self {
        Self {
            db,
            limiter,
            owner: None,
        }
    }

    /// Attach the owning horse for cache attribution.
    #[must_use]
    pub fn for_owner(mut self, horse_id: Uuid) -> Self {
        self.owner = Some(horse_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absence_failure_classification() {
        assert!(!Absence::NoData.is_failure());
        assert!(Absence::Timeout.is_failure());
        assert!(Absence::Network("reset".to_string()).is_failure());
        assert!(Absence::Parse("bad json".to_string()).is_failure());
    }

    #[test]
    fn test_absence_display_matches_error_strings() {
        assert_eq!(Absence::Timeout.to_string(), "timeout");
        assert_eq!(
            Absence::Parse("missing field".to_string()).to_string(),
            "parse error: missing field"
        );
    }

    #[test]
    fn test_outcome_records_empty_when_absent() {
        let outcome = FetchOutcome::Absent(Absence::Timeout);
        assert!(outcome.records().is_empty());
        assert!(outcome.failure().is_some());
        assert!(!outcome.is_fetched());

        let no_data = FetchOutcome::Absent(Absence::NoData);
        assert!(no_data.failure().is_none());
    }
}
