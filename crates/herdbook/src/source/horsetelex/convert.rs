//! Mapping from HorseTelex wire types to canonical candidate records.

use chrono::NaiveDate;

use crate::entity::data_source::DataSource;
use crate::entity::timeline_entry::EntryType;
use crate::source::{CandidateRecord, SourceError};

use super::types::{TelexIndices, TelexPedigree};

fn parse_date(raw: &str) -> Result<NaiveDate, SourceError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| SourceError::parse(format!("bad date {raw:?}: {e}")))
}

/// Registered offspring become breeding entries on the parent's timeline,
/// keyed by (type, date, partner) so the same foal never duplicates.
pub fn pedigree_to_candidates(
    pedigree: &TelexPedigree,
) -> Result<Vec<CandidateRecord>, SourceError> {
    pedigree
        .offspring
        .iter()
        .map(|foal| {
            let partner = foal.other_parent.as_deref().unwrap_or("unknown");
            Ok(CandidateRecord {
                entry_type: EntryType::Breeding,
                entry_date: parse_date(&foal.born)?,
                title: format!("Offspring registered: {}", foal.name),
                description: foal
                    .other_parent
                    .as_ref()
                    .map(|p| format!("{} out of pairing with {}", foal.name, p)),
                source: DataSource::Horsetelex,
                source_id: Some(foal.id.clone()),
                metadata: serde_json::json!({
                    "partner": partner,
                    "offspring": foal.name,
                }),
            })
        })
        .collect()
}

/// An indices snapshot becomes a single indices_update entry carrying all
/// published values; re-publications with the same snapshot id update the
/// stored entry in place.
pub fn indices_to_candidates(indices: &TelexIndices) -> Result<Vec<CandidateRecord>, SourceError> {
    if indices.indices.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![CandidateRecord {
        entry_type: EntryType::IndicesUpdate,
        entry_date: parse_date(&indices.published)?,
        title: "Breeding indices published".to_string(),
        description: None,
        source: DataSource::Horsetelex,
        source_id: Some(indices.snapshot_id.clone()),
        metadata: serde_json::json!({ "indices": indices.indices }),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::horsetelex::types::TelexOffspring;

    #[test]
    fn test_pedigree_offspring_become_breeding_entries() {
        let pedigree = TelexPedigree {
            offspring: vec![TelexOffspring {
                id: "ht-204518".to_string(),
                name: "Dream On".to_string(),
                born: "2023-04-12".to_string(),
                other_parent: Some("Casall".to_string()),
            }],
        };

        let candidates = pedigree_to_candidates(&pedigree).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entry_type, EntryType::Breeding);
        assert_eq!(candidates[0].partner(), Some("Casall"));
        assert_eq!(candidates[0].source_id.as_deref(), Some("ht-204518"));
    }

    #[test]
    fn test_indices_collapse_into_one_entry() {
        let mut values = std::collections::BTreeMap::new();
        values.insert("jumping".to_string(), 134.0);
        values.insert("dressage".to_string(), 92.0);
        let indices = TelexIndices {
            snapshot_id: "2026-01".to_string(),
            published: "2026-01-15".to_string(),
            indices: values,
        };

        let candidates = indices_to_candidates(&indices).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entry_type, EntryType::IndicesUpdate);
        assert_eq!(candidates[0].metadata["indices"]["jumping"], 134.0);
    }

    #[test]
    fn test_empty_indices_yield_no_candidates() {
        let indices = TelexIndices {
            snapshot_id: "2026-01".to_string(),
            published: "2026-01-15".to_string(),
            indices: std::collections::BTreeMap::new(),
        };
        assert!(indices_to_candidates(&indices).unwrap().is_empty());
    }
}
