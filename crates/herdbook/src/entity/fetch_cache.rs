//! FetchCache entity - durable cache of normalized external responses.
//!
//! One row per (source, source_id, data_type). Rows are upserted on every
//! successful fetch and lazily flagged stale on the first read past their
//! TTL; flagged rows keep serving their payload until a refresh or the
//! retention cleanup removes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::data_source::DataSource;

/// Kind of data a cache entry holds, one per adapter fetch operation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum DataType {
    /// Registry profile (ownership, passport data).
    #[sea_orm(string_value = "profile")]
    Profile,
    /// Ancestry and offspring records.
    #[sea_orm(string_value = "pedigree")]
    Pedigree,
    /// Historical competition results.
    #[sea_orm(string_value = "competitions")]
    Competitions,
    /// Breeding/genetic index values.
    #[sea_orm(string_value = "indices")]
    Indices,
    /// Marketplace sale listings.
    #[sea_orm(string_value = "sale_listings")]
    SaleListings,
    /// In-progress competition results. Never cached.
    #[sea_orm(string_value = "live_results")]
    LiveResults,
}

impl DataType {
    /// Cache TTL for this kind of data, reflecting how fast it moves.
    /// `None` means the data is never cached.
    pub fn ttl(&self) -> Option<chrono::Duration> {
        match self {
            DataType::Profile => Some(chrono::Duration::days(7)),
            DataType::Pedigree => Some(chrono::Duration::days(30)),
            DataType::Competitions => Some(chrono::Duration::hours(6)),
            DataType::Indices => Some(chrono::Duration::days(7)),
            DataType::SaleListings => Some(chrono::Duration::hours(12)),
            DataType::LiveResults => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Profile => "profile",
            DataType::Pedigree => "pedigree",
            DataType::Competitions => "competitions",
            DataType::Indices => "indices",
            DataType::SaleListings => "sale_listings",
            DataType::LiveResults => "live_results",
        };
        write!(f, "{}", s)
    }
}

/// FetchCache model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fetch_cache")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Source the payload was fetched from.
    pub source: DataSource,

    /// The external identifier the payload was fetched for.
    pub source_id: String,

    /// Kind of data the payload holds.
    pub data_type: DataType,

    /// Normalized records, serialized.
    #[sea_orm(column_type = "Json")]
    pub payload: serde_json::Value,

    /// When the payload was fetched from the source.
    pub fetched_at: DateTimeWithTimeZone,

    /// When the payload's TTL runs out.
    pub expires_at: DateTimeWithTimeZone,

    /// Set on the first read after `expires_at`; cleared on refresh.
    pub is_stale: bool,

    /// The horse this entry belongs to, for per-owner invalidation.
    pub horse_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the entry's TTL has run out at `now`, regardless of whether
    /// the stale flag has been persisted yet.
    pub fn is_expired_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at < now.fixed_offset()
    }
}
