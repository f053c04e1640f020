//! Mapping from FEI wire types to canonical candidate records.

use chrono::NaiveDate;

use crate::entity::data_source::DataSource;
use crate::entity::timeline_entry::EntryType;
use crate::source::{CandidateRecord, SourceError};

use super::types::{FeiHorse, FeiResult};

fn parse_date(raw: &str) -> Result<NaiveDate, SourceError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| SourceError::parse(format!("bad date {raw:?}: {e}")))
}

/// A profile yields one ownership entry per registered owner.
pub fn profile_to_candidates(horse: &FeiHorse) -> Result<Vec<CandidateRecord>, SourceError> {
    horse
        .owners
        .iter()
        .map(|owner| {
            Ok(CandidateRecord {
                entry_type: EntryType::Ownership,
                entry_date: parse_date(&owner.since)?,
                title: format!("Registered owner: {}", owner.name),
                description: Some(format!("{} registered to {}", horse.name, owner.name)),
                source: DataSource::Fei,
                source_id: None,
                metadata: serde_json::json!({ "partner": owner.name }),
            })
        })
        .collect()
}

/// Each result becomes one competition entry. The title combines show and
/// competition name; together with the date and source it forms the dedup
/// key, so rank/score changes on a re-fetch update the existing entry.
pub fn results_to_candidates(results: &[FeiResult]) -> Result<Vec<CandidateRecord>, SourceError> {
    results
        .iter()
        .map(|result| {
            let mut metadata = serde_json::Map::new();
            if let Some(rank) = result.rank {
                metadata.insert("rank".to_string(), rank.into());
            }
            if let Some(score) = result.score {
                metadata.insert("score".to_string(), score.into());
            }
            if let Some(discipline) = &result.discipline {
                metadata.insert("discipline".to_string(), discipline.as_str().into());
            }
            if let Some(rider) = &result.rider {
                metadata.insert("rider".to_string(), rider.as_str().into());
            }

            Ok(CandidateRecord {
                entry_type: EntryType::Competition,
                entry_date: parse_date(&result.date)?,
                title: format!("{}, {}", result.show, result.competition),
                description: result
                    .rank
                    .map(|rank| format!("Placed {} in {}", rank, result.competition)),
                source: DataSource::Fei,
                source_id: result.event_id.clone(),
                metadata: serde_json::Value::Object(metadata),
            })
        })
        .collect()
}
