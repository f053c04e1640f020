//! Sync status enum for the canonical horse record.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of the most recent sync pass for a horse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SyncStatus {
    /// Never synced, or explicitly re-queued for sync.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Last sync completed with no per-source errors.
    #[sea_orm(string_value = "synced")]
    Synced,
    /// Last sync completed with at least one per-source error.
    /// The next scheduled batch pass picks the horse up again.
    #[sea_orm(string_value = "error")]
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Pending => write!(f, "pending"),
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}
