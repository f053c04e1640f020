//! Store operations for the scraping job queue.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::data_source::DataSource;
use crate::entity::scraping_job::{
    ActiveModel, Column, Entity as ScrapingJob, JobStatus, JobType, Model,
};

use super::errors::{Result, StoreError};

/// Build a pending job row.
pub fn new_job(
    job_type: JobType,
    source: DataSource,
    params: serde_json::Value,
    is_recurring: bool,
    schedule: Option<&str>,
) -> ActiveModel {
    ActiveModel {
        id: Set(Uuid::new_v4()),
        job_type: Set(job_type),
        source: Set(source),
        params: Set(params),
        status: Set(JobStatus::Pending),
        items_found: Set(0),
        items_processed: Set(0),
        is_recurring: Set(is_recurring),
        schedule: Set(schedule.map(String::from)),
        scheduled_at: Set(None),
        started_at: Set(None),
        completed_at: Set(None),
        error: Set(None),
        result: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    }
}

/// Insert a job row.
pub async fn insert(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    model.insert(db).await.map_err(StoreError::from)
}

/// Insert a job unless an identical pending one already exists.
///
/// This is how the scheduler re-arms recurring work: it creates a fresh
/// pending row per cadence tick, and this guard keeps a backlog from piling
/// up when draining falls behind.
pub async fn ensure_pending(
    db: &DatabaseConnection,
    job_type: JobType,
    source: DataSource,
    params: serde_json::Value,
    schedule: Option<&str>,
) -> Result<Option<Model>> {
    let existing = ScrapingJob::find()
        .filter(Column::JobType.eq(job_type))
        .filter(Column::Source.eq(source))
        .filter(Column::Status.eq(JobStatus::Pending))
        .filter(Column::Params.eq(params.clone()))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(None);
    }

    let job = insert(db, new_job(job_type, source, params, true, schedule)).await?;
    Ok(Some(job))
}

/// Pending jobs whose scheduled time is unset or due, oldest first.
pub async fn list_due(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    limit: u64,
) -> Result<Vec<Model>> {
    let due = Condition::any()
        .add(Column::ScheduledAt.is_null())
        .add(Column::ScheduledAt.lte(now.fixed_offset()));

    ScrapingJob::find()
        .filter(Column::Status.eq(JobStatus::Pending))
        .filter(due)
        .order_by_asc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Most recently created jobs, any status. For operator inspection.
pub async fn list_recent(db: &DatabaseConnection, limit: u64) -> Result<Vec<Model>> {
    ScrapingJob::find()
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Transition a pending job to running.
///
/// Errors when the job is not pending: transitions are one-directional and
/// a second drain pass must not re-execute a job the first one picked up.
pub async fn mark_running(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let result = ScrapingJob::update_many()
        .col_expr(Column::Status, Expr::value(JobStatus::Running))
        .col_expr(Column::StartedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(JobStatus::Pending))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::invalid_input(format!(
            "job {id} is not pending"
        )));
    }
    Ok(())
}

/// Transition a running job to completed with its result counts.
pub async fn mark_completed(
    db: &DatabaseConnection,
    id: Uuid,
    items_found: i32,
    items_processed: i32,
    result: serde_json::Value,
) -> Result<()> {
    let model = ActiveModel {
        id: Set(id),
        status: Set(JobStatus::Completed),
        items_found: Set(items_found),
        items_processed: Set(items_processed),
        result: Set(Some(result)),
        completed_at: Set(Some(Utc::now().fixed_offset())),
        ..Default::default()
    };
    model.update(db).await?;
    Ok(())
}

/// Transition a running job to failed, retaining the error for diagnosis.
pub async fn mark_failed(db: &DatabaseConnection, id: Uuid, error: &str) -> Result<()> {
    let model = ActiveModel {
        id: Set(id),
        status: Set(JobStatus::Failed),
        error: Set(Some(error.to_string())),
        completed_at: Set(Some(Utc::now().fixed_offset())),
        ..Default::default()
    };
    model.update(db).await?;
    Ok(())
}

/// Delete finished jobs whose completion is older than `cutoff`. Returns the
/// number of rows removed.
pub async fn prune_finished(db: &DatabaseConnection, cutoff: DateTime<Utc>) -> Result<u64> {
    let result = ScrapingJob::delete_many()
        .filter(
            Condition::any()
                .add(Column::Status.eq(JobStatus::Completed))
                .add(Column::Status.eq(JobStatus::Failed)),
        )
        .filter(Column::CompletedAt.lt(cutoff.fixed_offset()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;

    async fn setup_db() -> DatabaseConnection {
        connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate")
    }

    fn params(horse: &str) -> serde_json::Value {
        serde_json::json!({ "horse_id": horse })
    }

    #[tokio::test]
    async fn job_walks_the_state_machine_to_completed() {
        let db = setup_db().await;
        let job = insert(
            &db,
            new_job(
                JobType::MarketRefresh,
                DataSource::Ehorses,
                params("h1"),
                false,
                None,
            ),
        )
        .await
        .unwrap();

        mark_running(&db, job.id).await.unwrap();
        mark_completed(&db, job.id, 5, 3, serde_json::json!({"added": 3}))
            .await
            .unwrap();

        let reloaded = ScrapingJob::find_by_id(job.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, JobStatus::Completed);
        assert_eq!(reloaded.items_found, 5);
        assert_eq!(reloaded.items_processed, 3);
        assert!(reloaded.started_at.is_some());
        assert!(reloaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn mark_running_refuses_non_pending_jobs() {
        let db = setup_db().await;
        let job = insert(
            &db,
            new_job(
                JobType::MarketRefresh,
                DataSource::Ehorses,
                params("h1"),
                false,
                None,
            ),
        )
        .await
        .unwrap();

        mark_running(&db, job.id).await.unwrap();
        let err = mark_running(&db, job.id)
            .await
            .expect_err("running job must not transition to running again");
        assert!(matches!(err, StoreError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn mark_failed_retains_the_error_message() {
        let db = setup_db().await;
        let job = insert(
            &db,
            new_job(
                JobType::HorseRefresh,
                DataSource::Fei,
                params("h1"),
                false,
                None,
            ),
        )
        .await
        .unwrap();

        mark_running(&db, job.id).await.unwrap();
        mark_failed(&db, job.id, "ehorses: timeout").await.unwrap();

        let reloaded = ScrapingJob::find_by_id(job.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, JobStatus::Failed);
        assert_eq!(reloaded.error.as_deref(), Some("ehorses: timeout"));
    }

    #[tokio::test]
    async fn ensure_pending_skips_duplicate_pending_jobs() {
        let db = setup_db().await;

        let first = ensure_pending(
            &db,
            JobType::MarketRefresh,
            DataSource::Ehorses,
            params("h1"),
            Some("daily"),
        )
        .await
        .unwrap();
        assert!(first.is_some());

        let second = ensure_pending(
            &db,
            JobType::MarketRefresh,
            DataSource::Ehorses,
            params("h1"),
            Some("daily"),
        )
        .await
        .unwrap();
        assert!(second.is_none(), "duplicate pending job must not be created");

        // Once the first finishes, re-arming creates a fresh row.
        let job = first.unwrap();
        mark_running(&db, job.id).await.unwrap();
        mark_completed(&db, job.id, 0, 0, serde_json::json!({}))
            .await
            .unwrap();

        let rearmed = ensure_pending(
            &db,
            JobType::MarketRefresh,
            DataSource::Ehorses,
            params("h1"),
            Some("daily"),
        )
        .await
        .unwrap();
        assert!(rearmed.is_some());
        assert_ne!(rearmed.unwrap().id, job.id, "finished rows are never reused");
    }

    #[tokio::test]
    async fn list_due_honors_scheduled_at() {
        let db = setup_db().await;
        let now = Utc::now();

        insert(
            &db,
            new_job(
                JobType::MarketRefresh,
                DataSource::Ehorses,
                params("immediate"),
                false,
                None,
            ),
        )
        .await
        .unwrap();

        let mut future = new_job(
            JobType::MarketRefresh,
            DataSource::Ehorses,
            params("later"),
            false,
            None,
        );
        future.scheduled_at = Set(Some((now + chrono::Duration::hours(2)).fixed_offset()));
        insert(&db, future).await.unwrap();

        let due = list_due(&db, now, 10).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].params, params("immediate"));
    }

    #[tokio::test]
    async fn prune_finished_keeps_recent_and_unfinished_jobs() {
        let db = setup_db().await;
        let now = Utc::now();

        let old = insert(
            &db,
            new_job(
                JobType::MarketRefresh,
                DataSource::Ehorses,
                params("old"),
                false,
                None,
            ),
        )
        .await
        .unwrap();
        mark_running(&db, old.id).await.unwrap();
        // Backdate completion past the retention cutoff.
        let backdate = ActiveModel {
            id: Set(old.id),
            status: Set(JobStatus::Completed),
            completed_at: Set(Some((now - chrono::Duration::days(60)).fixed_offset())),
            ..Default::default()
        };
        backdate.update(&db).await.unwrap();

        insert(
            &db,
            new_job(
                JobType::MarketRefresh,
                DataSource::Ehorses,
                params("pending"),
                false,
                None,
            ),
        )
        .await
        .unwrap();

        let removed = prune_finished(&db, now - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(list_recent(&db, 10).await.unwrap().len(), 1);
    }
}
