//! Reconciliation engine: merges adapter output into the canonical store.
//!
//! Candidates are matched against already-stored timeline entries by a
//! per-type natural key:
//!
//! - competition: (horse, date, title, source)
//! - ownership, breeding: (horse, type, date, partner)
//! - everything else: (horse, type, source, source_id) when the provider
//!   supplies an identifier, else (horse, type, date, title)
//!
//! No match inserts; a match with a materially changed payload updates in
//! place; an unchanged match is a no-op. Replaying identical adapter output
//! therefore adds nothing - idempotence is what makes the recurring
//! schedule safe.
//!
//! Keys use exact strings deliberately: providers do not guarantee stable
//! spellings across refetches, and guessing a canonicalization would merge
//! entries that may not be the same event. A respelled title becomes a new
//! entry, which is the accepted failure mode.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::entity::timeline_entry::{EntryType, Model as TimelineEntryModel};
use crate::source::CandidateRecord;
use crate::store::{self, Result};

/// Counters from one reconcile pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Candidates inserted as new entries.
    pub added: usize,
    /// Existing entries updated in place.
    pub updated: usize,
    /// Candidates that matched an identical stored entry.
    pub unchanged: usize,
}

impl ReconcileStats {
    /// Fold another pass's counters into this one.
    pub fn absorb(&mut self, other: ReconcileStats) {
        self.added += other.added;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
    }
}

/// Look up the stored entry a candidate deduplicates against, if any.
async fn find_existing(
    db: &DatabaseConnection,
    horse_id: Uuid,
    candidate: &CandidateRecord,
) -> Result<Option<TimelineEntryModel>> {
    match candidate.entry_type {
        EntryType::Competition => {
            store::timeline::find_competition(
                db,
                horse_id,
                candidate.entry_date,
                &candidate.title,
                candidate.source,
            )
            .await
        }
        EntryType::Ownership | EntryType::Breeding => {
            let siblings = store::timeline::list_by_type_and_date(
                db,
                horse_id,
                candidate.entry_type,
                candidate.entry_date,
            )
            .await?;
            Ok(siblings
                .into_iter()
                .find(|entry| entry.partner() == candidate.partner()))
        }
        _ => {
            if let Some(source_id) = &candidate.source_id {
                store::timeline::find_by_source_id(
                    db,
                    horse_id,
                    candidate.entry_type,
                    candidate.source,
                    source_id,
                )
                .await
            } else {
                store::timeline::find_by_title(
                    db,
                    horse_id,
                    candidate.entry_type,
                    candidate.entry_date,
                    &candidate.title,
                )
                .await
            }
        }
    }
}

/// Whether the stored entry's payload differs from the candidate's.
fn materially_changed(existing: &TimelineEntryModel, candidate: &CandidateRecord) -> bool {
    existing.metadata != candidate.metadata
        || existing.description != candidate.description
        || existing.source_id != candidate.source_id
}

/// Merge a set of candidates into a horse's stored records.
///
/// Candidates from any number of sources can be merged in one pass; one
/// source's absence never blocks another's records, because absence simply
/// means its candidates are not in the slice.
pub async fn reconcile(
    db: &DatabaseConnection,
    horse_id: Uuid,
    candidates: &[CandidateRecord],
) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();

    for candidate in candidates {
        match find_existing(db, horse_id, candidate).await? {
            None => {
                store::timeline::insert(db, store::timeline::from_candidate(horse_id, candidate))
                    .await?;
                stats.added += 1;
            }
            Some(existing) if materially_changed(&existing, candidate) => {
                store::timeline::update_payload(db, &existing, candidate).await?;
                stats.updated += 1;
            }
            Some(_) => {
                stats.unchanged += 1;
            }
        }
    }

    tracing::debug!(
        %horse_id,
        added = stats.added,
        updated = stats.updated,
        unchanged = stats.unchanged,
        "reconciled candidates"
    );

    Ok(stats)
}

/// The horse's full timeline: manually entered and synced entries
/// interleaved, newest first.
pub async fn timeline(
    db: &DatabaseConnection,
    horse_id: Uuid,
) -> Result<Vec<TimelineEntryModel>> {
    store::timeline::list_for_horse(db, horse_id).await
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::connect_and_migrate;
    use crate::entity::data_source::DataSource;
    use crate::store::horse;

    async fn setup() -> (DatabaseConnection, Uuid) {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");
        let horse = horse::insert(&db, horse::new_horse("Cornet's Dream"))
            .await
            .expect("horse should insert");
        (db, horse.id)
    }

    fn competition(title: &str, rank: u32) -> CandidateRecord {
        CandidateRecord {
            entry_type: EntryType::Competition,
            entry_date: NaiveDate::from_ymd_opt(2026, 5, 3).unwrap(),
            title: title.to_string(),
            description: Some(format!("Placed {rank}")),
            source: DataSource::Fei,
            source_id: None,
            metadata: serde_json::json!({"rank": rank}),
        }
    }

    fn breeding(partner: &str, day: u32) -> CandidateRecord {
        CandidateRecord {
            entry_type: EntryType::Breeding,
            entry_date: NaiveDate::from_ymd_opt(2023, 4, day).unwrap(),
            title: "Offspring registered: Dream On".to_string(),
            description: None,
            source: DataSource::Horsetelex,
            source_id: None,
            metadata: serde_json::json!({"partner": partner}),
        }
    }

    fn sale(listing_id: &str, price: u64) -> CandidateRecord {
        CandidateRecord {
            entry_type: EntryType::Sale,
            entry_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            title: "Listed for sale: Cornet's Dream".to_string(),
            description: None,
            source: DataSource::Ehorses,
            source_id: Some(listing_id.to_string()),
            metadata: serde_json::json!({"listing_id": listing_id, "price_eur": price}),
        }
    }

    #[tokio::test]
    async fn new_candidates_are_inserted() {
        let (db, horse_id) = setup().await;
        let candidates = vec![
            competition("CSI3* Aachen, Grand Prix", 4),
            competition("CSI3* Aachen, Speed Class", 1),
        ];

        let stats = reconcile(&db, horse_id, &candidates).await.unwrap();
        assert_eq!(stats.added, 2);
        assert_eq!(stats.updated, 0);
        assert_eq!(timeline(&db, horse_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn replaying_identical_output_adds_nothing() {
        let (db, horse_id) = setup().await;
        let candidates = vec![
            competition("CSI3* Aachen, Grand Prix", 4),
            breeding("Casall", 12),
            sale("778812-3", 85_000),
        ];

        let first = reconcile(&db, horse_id, &candidates).await.unwrap();
        assert_eq!(first.added, 3);

        let second = reconcile(&db, horse_id, &candidates).await.unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 3);
        assert_eq!(timeline(&db, horse_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn changed_rank_updates_the_stored_entry_in_place() {
        let (db, horse_id) = setup().await;

        reconcile(&db, horse_id, &[competition("CSI3* Aachen, Grand Prix", 4)])
            .await
            .unwrap();

        // Same dedup key, revised rank: the provider corrected the result.
        let stats = reconcile(&db, horse_id, &[competition("CSI3* Aachen, Grand Prix", 2)])
            .await
            .unwrap();
        assert_eq!(stats.added, 0);
        assert_eq!(stats.updated, 1);

        let entries = timeline(&db, horse_id).await.unwrap();
        assert_eq!(entries.len(), 1, "update must never duplicate");
        assert_eq!(entries[0].metadata["rank"], 2);
    }

    #[tokio::test]
    async fn breeding_entries_key_on_partner() {
        let (db, horse_id) = setup().await;

        // Two foals born the same day by different mates: distinct entries.
        let stats = reconcile(&db, horse_id, &[breeding("Casall", 12), breeding("Chacco", 12)])
            .await
            .unwrap();
        assert_eq!(stats.added, 2);

        // Same partner and date again: deduplicated.
        let stats = reconcile(&db, horse_id, &[breeding("Casall", 12)])
            .await
            .unwrap();
        assert_eq!(stats.added, 0);
        assert_eq!(stats.unchanged, 1);
    }

    #[tokio::test]
    async fn sale_entries_key_on_source_id() {
        let (db, horse_id) = setup().await;

        reconcile(&db, horse_id, &[sale("778812-3", 85_000)])
            .await
            .unwrap();

        // Price drop on the same listing: in-place update.
        let stats = reconcile(&db, horse_id, &[sale("778812-3", 79_000)])
            .await
            .unwrap();
        assert_eq!(stats.updated, 1);

        // A different listing id is a new event.
        let stats = reconcile(&db, horse_id, &[sale("778812-9", 79_000)])
            .await
            .unwrap();
        assert_eq!(stats.added, 1);

        assert_eq!(timeline(&db, horse_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn candidates_for_different_horses_do_not_collide() {
        let (db, horse_a) = setup().await;
        let horse_b = horse::insert(&db, horse::new_horse("Other Horse"))
            .await
            .unwrap()
            .id;

        reconcile(&db, horse_a, &[competition("CSI3* Aachen, Grand Prix", 4)])
            .await
            .unwrap();
        let stats = reconcile(&db, horse_b, &[competition("CSI3* Aachen, Grand Prix", 9)])
            .await
            .unwrap();
        assert_eq!(stats.added, 1, "dedup keys are scoped per horse");
    }
}
