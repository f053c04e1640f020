//! Horse entity - the canonical local record external data is merged into.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::data_source::DataSource;
use crate::entity::sync_status::SyncStatus;

/// Horse model - one row per tracked horse.
///
/// External identifiers are nullable: a horse known only from manual entry
/// has none, and the sync engine only invokes the adapters whose identifier
/// is present.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "horses")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Profile ─────────────────────────────────────────────────────────────
    /// Registered name.
    pub name: String,
    /// Breed or studbook designation.
    pub breed: Option<String>,
    /// Year of birth.
    pub year_of_birth: Option<i32>,
    /// Country of registration (ISO 3166 alpha-3, as FEI uses).
    pub country: Option<String>,

    // ─── External Identifiers ────────────────────────────────────────────────
    /// FEI passport/registration number.
    pub fei_id: Option<String>,
    /// HorseTelex database identifier.
    pub horsetelex_id: Option<String>,
    /// ehorses listing/seller identifier.
    pub ehorses_id: Option<String>,

    // ─── Sync Tracking ───────────────────────────────────────────────────────
    /// Outcome of the most recent sync pass.
    pub sync_status: SyncStatus,
    /// When the last sync pass for this horse finished.
    pub last_sync_at: Option<DateTimeWithTimeZone>,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    /// When this record was created.
    pub created_at: DateTimeWithTimeZone,
    /// When this record was last modified.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A horse has many timeline entries.
    #[sea_orm(has_many = "super::timeline_entry::Entity")]
    TimelineEntry,
}

impl Related<super::timeline_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimelineEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The external identifier registered for `source`, if any.
    pub fn external_id(&self, source: DataSource) -> Option<&str> {
        match source {
            DataSource::Fei => self.fei_id.as_deref(),
            DataSource::Horsetelex => self.horsetelex_id.as_deref(),
            DataSource::Ehorses => self.ehorses_id.as_deref(),
        }
    }

    /// Whether the horse carries at least one external identifier.
    pub fn has_external_ids(&self) -> bool {
        DataSource::ALL
            .iter()
            .any(|source| self.external_id(*source).is_some())
    }
}
