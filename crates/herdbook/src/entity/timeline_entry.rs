//! TimelineEntry entity - dated events on a horse's history.
//!
//! Entries come from two places: manual entry by a user (source = NULL) and
//! the reconciliation engine merging adapter output (source set, source_id
//! carrying the provider's own identifier when it has one). Entries are
//! updated in place on reconciliation conflicts and never deleted except
//! together with the horse.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::data_source::DataSource;

/// Kind of timeline event.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum EntryType {
    /// Change of ownership.
    #[sea_orm(string_value = "ownership")]
    Ownership,
    /// Competition start/result.
    #[sea_orm(string_value = "competition")]
    Competition,
    /// Veterinary event.
    #[sea_orm(string_value = "health")]
    Health,
    /// Stable/yard relocation.
    #[sea_orm(string_value = "location")]
    Location,
    /// Training milestone.
    #[sea_orm(string_value = "training")]
    Training,
    /// Sale or sale listing.
    #[sea_orm(string_value = "sale")]
    Sale,
    /// Covering, foaling, or registered offspring.
    #[sea_orm(string_value = "breeding")]
    Breeding,
    /// Updated breeding/genetic indices.
    #[sea_orm(string_value = "indices_update")]
    IndicesUpdate,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryType::Ownership => "ownership",
            EntryType::Competition => "competition",
            EntryType::Health => "health",
            EntryType::Location => "location",
            EntryType::Training => "training",
            EntryType::Sale => "sale",
            EntryType::Breeding => "breeding",
            EntryType::IndicesUpdate => "indices_update",
        };
        write!(f, "{}", s)
    }
}

/// TimelineEntry model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "timeline_entries")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// The horse this entry belongs to.
    pub horse_id: Uuid,

    /// Kind of event.
    pub entry_type: EntryType,

    /// Date the event took place (not the date it was ingested).
    pub entry_date: Date,

    /// Short headline, e.g. "CSI3* Grand Prix, Aachen".
    pub title: String,

    /// Longer free-form description.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Originating source; NULL for manually entered events.
    pub source: Option<DataSource>,

    /// The provider's own identifier for this event, when it has one.
    /// Used for dedup of externally sourced entries.
    pub source_id: Option<String>,

    /// Whether a user has confirmed the entry.
    pub verified: bool,

    /// Type-specific structured payload (rank, score, partner, price, ...).
    #[sea_orm(column_type = "Json")]
    pub metadata: serde_json::Value,

    /// When this entry was created.
    pub created_at: DateTimeWithTimeZone,
    /// When this entry was last modified.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An entry belongs to a horse.
    #[sea_orm(
        belongs_to = "super::horse::Entity",
        from = "Column::HorseId",
        to = "super::horse::Column::Id"
    )]
    Horse,
}

impl Related<super::horse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Horse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The partner identifier carried in metadata for ownership/breeding
    /// entries (new owner name, the other parent), if present.
    pub fn partner(&self) -> Option<&str> {
        self.metadata.get("partner").and_then(|v| v.as_str())
    }
}
