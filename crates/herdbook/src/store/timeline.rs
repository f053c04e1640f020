//! Store operations for timeline entries.
//!
//! The dedup *policy* (which fields form the key per entry type) lives in
//! the reconciliation engine; this module provides the matching finders and
//! the insert/update write path.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::data_source::DataSource;
use crate::entity::timeline_entry::{ActiveModel, Column, Entity as TimelineEntry, EntryType, Model};
use crate::source::CandidateRecord;

use super::errors::{Result, StoreError};

/// Insert a new entry.
pub async fn insert(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    model.insert(db).await.map_err(StoreError::from)
}

/// Find a competition entry by its dedup key (horse, date, title, source).
pub async fn find_competition(
    db: &DatabaseConnection,
    horse_id: Uuid,
    entry_date: NaiveDate,
    title: &str,
    source: DataSource,
) -> Result<Option<Model>> {
    TimelineEntry::find()
        .filter(Column::HorseId.eq(horse_id))
        .filter(Column::EntryType.eq(EntryType::Competition))
        .filter(Column::EntryDate.eq(entry_date))
        .filter(Column::Title.eq(title))
        .filter(Column::Source.eq(source))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// List entries of one type on one date, for partner-keyed matching
/// (ownership and breeding entries key on the metadata partner, which is
/// matched in code rather than in SQL).
pub async fn list_by_type_and_date(
    db: &DatabaseConnection,
    horse_id: Uuid,
    entry_type: EntryType,
    entry_date: NaiveDate,
) -> Result<Vec<Model>> {
    TimelineEntry::find()
        .filter(Column::HorseId.eq(horse_id))
        .filter(Column::EntryType.eq(entry_type))
        .filter(Column::EntryDate.eq(entry_date))
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Find an entry by the provider's own identifier.
pub async fn find_by_source_id(
    db: &DatabaseConnection,
    horse_id: Uuid,
    entry_type: EntryType,
    source: DataSource,
    source_id: &str,
) -> Result<Option<Model>> {
    TimelineEntry::find()
        .filter(Column::HorseId.eq(horse_id))
        .filter(Column::EntryType.eq(entry_type))
        .filter(Column::Source.eq(source))
        .filter(Column::SourceId.eq(source_id))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find an entry by the fallback key (type, date, title).
pub async fn find_by_title(
    db: &DatabaseConnection,
    horse_id: Uuid,
    entry_type: EntryType,
    entry_date: NaiveDate,
    title: &str,
) -> Result<Option<Model>> {
    TimelineEntry::find()
        .filter(Column::HorseId.eq(horse_id))
        .filter(Column::EntryType.eq(entry_type))
        .filter(Column::EntryDate.eq(entry_date))
        .filter(Column::Title.eq(title))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Update the mutable payload of an existing entry in place.
pub async fn update_payload(
    db: &DatabaseConnection,
    existing: &Model,
    candidate: &CandidateRecord,
) -> Result<Model> {
    let model = ActiveModel {
        id: Set(existing.id),
        description: Set(candidate.description.clone()),
        metadata: Set(candidate.metadata.clone()),
        source_id: Set(candidate.source_id.clone()),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    model.update(db).await.map_err(StoreError::from)
}

/// All entries for a horse, manual and synced interleaved, newest first.
pub async fn list_for_horse(db: &DatabaseConnection, horse_id: Uuid) -> Result<Vec<Model>> {
    TimelineEntry::find()
        .filter(Column::HorseId.eq(horse_id))
        .order_by_desc(Column::EntryDate)
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Build an active model from a candidate record.
pub fn from_candidate(horse_id: Uuid, candidate: &CandidateRecord) -> ActiveModel {
    let now = Utc::now().fixed_offset();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        horse_id: Set(horse_id),
        entry_type: Set(candidate.entry_type),
        entry_date: Set(candidate.entry_date),
        title: Set(candidate.title.clone()),
        description: Set(candidate.description.clone()),
        source: Set(Some(candidate.source)),
        source_id: Set(candidate.source_id.clone()),
        verified: Set(false),
        metadata: Set(candidate.metadata.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Build an active model for a manually entered event.
pub fn manual_entry(
    horse_id: Uuid,
    entry_type: EntryType,
    entry_date: NaiveDate,
    title: &str,
) -> ActiveModel {
    let now = Utc::now().fixed_offset();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        horse_id: Set(horse_id),
        entry_type: Set(entry_type),
        entry_date: Set(entry_date),
        title: Set(title.to_string()),
        description: Set(None),
        source: Set(None),
        source_id: Set(None),
        verified: Set(true),
        metadata: Set(serde_json::json!({})),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
