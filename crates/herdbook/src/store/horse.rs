//! Store operations for the canonical horse record.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::horse::{ActiveModel, Column, Entity as Horse, Model};
use crate::entity::sync_status::SyncStatus;

use super::errors::{Result, StoreError};

/// Insert a new horse.
pub async fn insert(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    model.insert(db).await.map_err(StoreError::from)
}

/// Find a horse by its UUID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>> {
    Horse::find_by_id(id).one(db).await.map_err(StoreError::from)
}

/// Find a horse by its UUID, erroring when it does not exist.
pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<Model> {
    find_by_id(db, id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("horse {id}")))
}

/// Select horses due for a sync pass, oldest-synced first.
///
/// A horse is due when its status is pending, it has never been synced, or
/// its last sync is older than `horizon` - and it carries at least one
/// external identifier (there is nothing to sync otherwise).
pub async fn list_needing_sync(
    db: &DatabaseConnection,
    horizon: chrono::Duration,
    limit: u64,
) -> Result<Vec<Model>> {
    let cutoff = (Utc::now() - horizon).fixed_offset();

    let due = Condition::any()
        .add(Column::SyncStatus.eq(SyncStatus::Pending))
        .add(Column::LastSyncAt.is_null())
        .add(Column::LastSyncAt.lt(cutoff));

    let has_external_id = Condition::any()
        .add(Column::FeiId.is_not_null())
        .add(Column::HorsetelexId.is_not_null())
        .add(Column::EhorsesId.is_not_null());

    Horse::find()
        .filter(due)
        .filter(has_external_id)
        .order_by_asc(Column::LastSyncAt)
        .limit(limit)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Record the outcome of a sync pass.
pub async fn update_sync_status(
    db: &DatabaseConnection,
    id: Uuid,
    status: SyncStatus,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let result = Horse::update_many()
        .col_expr(Column::SyncStatus, Expr::value(status))
        .col_expr(Column::LastSyncAt, Expr::value(timestamp.fixed_offset()))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::not_found(format!("horse {id}")));
    }
    Ok(())
}

/// Horses listed on the marketplace, i.e. candidates for market refresh
/// jobs.
pub async fn list_with_market_ids(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Horse::find()
        .filter(Column::EhorsesId.is_not_null())
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Build a minimally populated active model for a new horse.
pub fn new_horse(name: &str) -> ActiveModel {
    let now = Utc::now().fixed_offset();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        breed: Set(None),
        year_of_birth: Set(None),
        country: Set(None),
        fei_id: Set(None),
        horsetelex_id: Set(None),
        ehorses_id: Set(None),
        sync_status: Set(SyncStatus::Pending),
        last_sync_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
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

    async fn insert_horse(
        db: &DatabaseConnection,
        name: &str,
        fei_id: Option<&str>,
        status: SyncStatus,
        last_sync: Option<DateTime<Utc>>,
    ) -> Model {
        let mut model = new_horse(name);
        model.fei_id = Set(fei_id.map(String::from));
        model.sync_status = Set(status);
        model.last_sync_at = Set(last_sync.map(|t| t.fixed_offset()));
        insert(db, model).await.expect("horse should insert")
    }

    #[tokio::test]
    async fn list_needing_sync_selects_pending_never_synced_and_stale() {
        let db = setup_db().await;
        let now = Utc::now();

        insert_horse(&db, "pending", Some("FEI-1"), SyncStatus::Pending, None).await;
        insert_horse(
            &db,
            "stale",
            Some("FEI-2"),
            SyncStatus::Synced,
            Some(now - chrono::Duration::days(8)),
        )
        .await;
        insert_horse(
            &db,
            "fresh",
            Some("FEI-3"),
            SyncStatus::Synced,
            Some(now - chrono::Duration::hours(2)),
        )
        .await;
        // Due by staleness but unsyncable: no external ids.
        insert_horse(&db, "no-ids", None, SyncStatus::Pending, None).await;

        let due = list_needing_sync(&db, chrono::Duration::days(7), 10)
            .await
            .expect("listing should succeed");

        let names: Vec<_> = due.iter().map(|h| h.name.as_str()).collect();
        assert!(names.contains(&"pending"));
        assert!(names.contains(&"stale"));
        assert!(!names.contains(&"fresh"));
        assert!(!names.contains(&"no-ids"));
    }

    #[tokio::test]
    async fn list_needing_sync_respects_limit() {
        let db = setup_db().await;
        for i in 0..5 {
            insert_horse(
                &db,
                &format!("horse-{i}"),
                Some(&format!("FEI-{i}")),
                SyncStatus::Pending,
                None,
            )
            .await;
        }

        let due = list_needing_sync(&db, chrono::Duration::days(7), 2)
            .await
            .unwrap();
        assert_eq!(due.len(), 2);
    }

    #[tokio::test]
    async fn update_sync_status_writes_status_and_timestamp() {
        let db = setup_db().await;
        let horse = insert_horse(&db, "one", Some("FEI-1"), SyncStatus::Pending, None).await;

        let ts = Utc::now();
        update_sync_status(&db, horse.id, SyncStatus::Synced, ts)
            .await
            .expect("update should succeed");

        let reloaded = get(&db, horse.id).await.unwrap();
        assert_eq!(reloaded.sync_status, SyncStatus::Synced);
        assert!(reloaded.last_sync_at.is_some());
    }

    #[tokio::test]
    async fn update_sync_status_errors_for_unknown_horse() {
        let db = setup_db().await;
        let err = update_sync_status(&db, Uuid::new_v4(), SyncStatus::Synced, Utc::now())
            .await
            .expect_err("unknown horse should error");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
