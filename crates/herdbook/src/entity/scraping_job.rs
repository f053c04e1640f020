//! ScrapingJob entity - the durable queue of scrape work.
//!
//! Jobs move pending → running → completed | failed, one direction only.
//! Recurring jobs are not reset after finishing; the scheduler re-arms them
//! by creating fresh pending rows on its own cadence.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::data_source::DataSource;

/// Kind of scrape a job performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum JobType {
    /// Refresh marketplace sale listings for one horse.
    #[sea_orm(string_value = "market_refresh")]
    MarketRefresh,
    /// Full multi-source sync for one horse.
    #[sea_orm(string_value = "horse_refresh")]
    HorseRefresh,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::MarketRefresh => write!(f, "market_refresh"),
            JobType::HorseRefresh => write!(f, "horse_refresh"),
        }
    }
}

/// Job lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum JobStatus {
    /// Queued, not yet picked up.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Picked up by a drain pass.
    #[sea_orm(string_value = "running")]
    Running,
    /// Finished successfully.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Finished with an error; the message is kept on the row.
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// ScrapingJob model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scraping_jobs")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Kind of scrape.
    pub job_type: JobType,

    /// Source the scrape targets.
    pub source: DataSource,

    /// Opaque target parameters (horse id, identifier, query filters).
    #[sea_orm(column_type = "Json")]
    pub params: serde_json::Value,

    /// Lifecycle state.
    pub status: JobStatus,

    // ─── Progress ────────────────────────────────────────────────────────────
    /// Items discovered at the source.
    pub items_found: i32,
    /// Items that made it through reconciliation.
    pub items_processed: i32,

    // ─── Scheduling ──────────────────────────────────────────────────────────
    /// Whether the scheduler re-arms this job on its own cadence.
    pub is_recurring: bool,
    /// Human-readable cadence the job was armed with (e.g. "daily").
    pub schedule: Option<String>,
    /// Earliest time a drain pass may pick the job up; NULL = immediately.
    pub scheduled_at: Option<DateTimeWithTimeZone>,

    // ─── Outcome ─────────────────────────────────────────────────────────────
    /// When a drain pass picked the job up.
    pub started_at: Option<DateTimeWithTimeZone>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTimeWithTimeZone>,
    /// Error message for failed jobs.
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    /// Result payload for completed jobs.
    #[sea_orm(column_type = "Json", nullable)]
    pub result: Option<serde_json::Value>,

    /// When the job row was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The horse id carried in params, when the job targets a single horse.
    pub fn horse_id(&self) -> Option<Uuid> {
        self.params
            .get("horse_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}
