//! Durable fetch cache operations.
//!
//! The cache holds normalized external responses keyed by
//! (source, source_id, data_type). There is no in-process cache layer: every
//! read and write goes to the durable store, so concurrent writers to the
//! same key race safely with last-write-wins semantics.
//!
//! Expiry is lazy. A read past `expires_at` still returns the payload
//! (stale-while-revalidate) and flags the row stale as a side effect; the
//! row is only removed by explicit invalidation or the retention cleanup.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entity::data_source::DataSource;
use crate::entity::fetch_cache::{ActiveModel, Column, DataType, Entity as FetchCache, Model};

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Look up a cache entry by its key.
///
/// Returns `None` when the key is absent. When the entry exists but has
/// passed its TTL, the payload is returned anyway and the row is flagged
/// stale as a side effect; callers never block on expiry alone.
pub async fn get(
    db: &DatabaseConnection,
    source: DataSource,
    source_id: &str,
    data_type: DataType,
) -> Result<Option<Model>> {
    let entry = FetchCache::find()
        .filter(Column::Source.eq(source))
        .filter(Column::SourceId.eq(source_id))
        .filter(Column::DataType.eq(data_type))
        .one(db)
        .await?;

    let Some(mut entry) = entry else {
        return Ok(None);
    };

    if !entry.is_stale && entry.is_expired_at(Utc::now()) {
        FetchCache::update_many()
            .col_expr(Column::IsStale, Expr::value(true))
            .filter(Column::Id.eq(entry.id))
            .exec(db)
            .await?;
        entry.is_stale = true;
    }

    Ok(Some(entry))
}

/// Store or refresh a cache entry.
///
/// Upserts on the (source, source_id, data_type) key, resetting
/// `expires_at = now + ttl` and clearing the stale flag.
pub async fn set(
    db: &DatabaseConnection,
    source: DataSource,
    source_id: &str,
    data_type: DataType,
    payload: serde_json::Value,
    ttl: chrono::Duration,
    horse_id: Option<Uuid>,
) -> Result<()> {
    let now = Utc::now();

    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        source: Set(source),
        source_id: Set(source_id.to_string()),
        data_type: Set(data_type),
        payload: Set(payload),
        fetched_at: Set(now.fixed_offset()),
        expires_at: Set((now + ttl).fixed_offset()),
        is_stale: Set(false),
        horse_id: Set(horse_id),
    };

    FetchCache::insert(model)
        .on_conflict(
            OnConflict::columns([Column::Source, Column::SourceId, Column::DataType])
                .update_columns([
                    Column::Payload,
                    Column::FetchedAt,
                    Column::ExpiresAt,
                    Column::IsStale,
                    Column::HorseId,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

/// Delete one cache entry, or all entries for (source, source_id) when
/// `data_type` is omitted. Returns the number of rows removed.
pub async fn invalidate(
    db: &DatabaseConnection,
    source: DataSource,
    source_id: &str,
    data_type: Option<DataType>,
) -> Result<u64> {
    let mut delete = FetchCache::delete_many()
        .filter(Column::Source.eq(source))
        .filter(Column::SourceId.eq(source_id));

    if let Some(data_type) = data_type {
        delete = delete.filter(Column::DataType.eq(data_type));
    }

    let result = delete.exec(db).await?;
    Ok(result.rows_affected)
}

/// Delete every cache entry tied to one horse. Returns the number of rows
/// removed.
pub async fn invalidate_for_owner(db: &DatabaseConnection, horse_id: Uuid) -> Result<u64> {
    let result = FetchCache::delete_many()
        .filter(Column::HorseId.eq(horse_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// List up to `limit` entries that are flagged stale or past their TTL,
/// oldest-fetched first.
///
/// The ordering spreads refresh load over the whole keyspace instead of
/// re-refreshing the few keys that happen to sort first.
pub async fn stale_entries(
    db: &DatabaseConnection,
    source: Option<DataSource>,
    limit: u64,
) -> Result<Vec<Model>> {
    let now = Utc::now().fixed_offset();

    let mut query = FetchCache::find().filter(
        Condition::any()
            .add(Column::IsStale.eq(true))
            .add(Column::ExpiresAt.lt(now)),
    );

    if let Some(source) = source {
        query = query.filter(Column::Source.eq(source));
    }

    let entries = query
        .order_by_asc(Column::FetchedAt)
        .limit(limit)
        .all(db)
        .await?;

    Ok(entries)
}

/// Delete entries whose TTL ran out more than `max_age_days` ago.
///
/// Pure retention: the stale flag is not consulted, so recently expired
/// rows keep serving as stale fallbacks. Returns the number of rows removed.
pub async fn cleanup(db: &DatabaseConnection, max_age_days: i64) -> Result<u64> {
    let cutoff = Utc::now() - chrono::Duration::days(max_age_days);

    let result = FetchCache::delete_many()
        .filter(Column::ExpiresAt.lt(cutoff.fixed_offset()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
