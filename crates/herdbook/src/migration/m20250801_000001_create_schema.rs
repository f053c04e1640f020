//! Initial migration to create the herdbook database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_horses(manager).await?;
        self.create_timeline_entries(manager).await?;
        self.create_fetch_cache(manager).await?;
        self.create_scraping_jobs(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapingJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FetchCache::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TimelineEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Horses::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_horses(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Horses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Horses::Id).uuid().not_null().primary_key())
                    // Profile
                    .col(ColumnDef::new(Horses::Name).string().not_null())
                    .col(ColumnDef::new(Horses::Breed).string().null())
                    .col(ColumnDef::new(Horses::YearOfBirth).integer().null())
                    .col(ColumnDef::new(Horses::Country).string().null())
                    // External identifiers
                    .col(ColumnDef::new(Horses::FeiId).string().null())
                    .col(ColumnDef::new(Horses::HorsetelexId).string().null())
                    .col(ColumnDef::new(Horses::EhorsesId).string().null())
                    // Sync tracking
                    .col(
                        ColumnDef::new(Horses::SyncStatus)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Horses::LastSyncAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(Horses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Horses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // External identifiers are each unique where present
        manager
            .create_index(
                Index::create()
                    .name("idx_horses_fei_id")
                    .table(Horses::Table)
                    .col(Horses::FeiId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_horses_horsetelex_id")
                    .table(Horses::Table)
                    .col(Horses::HorsetelexId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_horses_ehorses_id")
                    .table(Horses::Table)
                    .col(Horses::EhorsesId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Batch selection scans status + last_sync_at
        manager
            .create_index(
                Index::create()
                    .name("idx_horses_sync_status_last_sync")
                    .table(Horses::Table)
                    .col(Horses::SyncStatus)
                    .col(Horses::LastSyncAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_timeline_entries(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TimelineEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimelineEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TimelineEntries::HorseId).uuid().not_null())
                    .col(
                        ColumnDef::new(TimelineEntries::EntryType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TimelineEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(TimelineEntries::Title).string().not_null())
                    .col(ColumnDef::new(TimelineEntries::Description).text().null())
                    .col(ColumnDef::new(TimelineEntries::Source).string().null())
                    .col(ColumnDef::new(TimelineEntries::SourceId).string().null())
                    .col(
                        ColumnDef::new(TimelineEntries::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TimelineEntries::Metadata)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    .col(
                        ColumnDef::new(TimelineEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TimelineEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timeline_entries_horse")
                            .from(TimelineEntries::Table, TimelineEntries::HorseId)
                            .to(Horses::Table, Horses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Timeline reads are per-horse, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_timeline_horse_date")
                    .table(TimelineEntries::Table)
                    .col(TimelineEntries::HorseId)
                    .col((TimelineEntries::EntryDate, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Dedup lookups filter on (horse, type, date) plus per-type columns
        manager
            .create_index(
                Index::create()
                    .name("idx_timeline_dedup")
                    .table(TimelineEntries::Table)
                    .col(TimelineEntries::HorseId)
                    .col(TimelineEntries::EntryType)
                    .col(TimelineEntries::EntryDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_fetch_cache(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FetchCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FetchCache::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FetchCache::Source).string().not_null())
                    .col(ColumnDef::new(FetchCache::SourceId).string().not_null())
                    .col(ColumnDef::new(FetchCache::DataType).string().not_null())
                    .col(ColumnDef::new(FetchCache::Payload).json().not_null())
                    .col(
                        ColumnDef::new(FetchCache::FetchedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FetchCache::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FetchCache::IsStale)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FetchCache::HorseId).uuid().null())
                    .to_owned(),
            )
            .await?;

        // At most one entry per (source, source_id, data_type)
        manager
            .create_index(
                Index::create()
                    .name("idx_fetch_cache_key")
                    .table(FetchCache::Table)
                    .col(FetchCache::Source)
                    .col(FetchCache::SourceId)
                    .col(FetchCache::DataType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Stale-entry listing orders by fetched_at
        manager
            .create_index(
                Index::create()
                    .name("idx_fetch_cache_fetched_at")
                    .table(FetchCache::Table)
                    .col(FetchCache::FetchedAt)
                    .to_owned(),
            )
            .await?;

        // Per-owner invalidation
        manager
            .create_index(
                Index::create()
                    .name("idx_fetch_cache_horse")
                    .table(FetchCache::Table)
                    .col(FetchCache::HorseId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_scraping_jobs(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapingJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapingJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapingJobs::JobType).string().not_null())
                    .col(ColumnDef::new(ScrapingJobs::Source).string().not_null())
                    .col(
                        ColumnDef::new(ScrapingJobs::Params)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::ItemsFound)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::ItemsProcessed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::IsRecurring)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ScrapingJobs::Schedule).string().null())
                    .col(
                        ColumnDef::new(ScrapingJobs::ScheduledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ScrapingJobs::Error).text().null())
                    .col(ColumnDef::new(ScrapingJobs::Result).json().null())
                    .col(
                        ColumnDef::new(ScrapingJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Drain passes scan (status, scheduled_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_scraping_jobs_status_scheduled")
                    .table(ScrapingJobs::Table)
                    .col(ScrapingJobs::Status)
                    .col(ScrapingJobs::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "horses")]
enum Horses {
    Table,
    Id,
    Name,
    Breed,
    YearOfBirth,
    Country,
    FeiId,
    HorsetelexId,
    EhorsesId,
    SyncStatus,
    LastSyncAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "timeline_entries")]
enum TimelineEntries {
    Table,
    Id,
    HorseId,
    EntryType,
    EntryDate,
    Title,
    Description,
    Source,
    SourceId,
    Verified,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "fetch_cache")]
enum FetchCache {
    Table,
    Id,
    Source,
    SourceId,
    DataType,
    Payload,
    FetchedAt,
    ExpiresAt,
    IsStale,
    HorseId,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "scraping_jobs")]
enum ScrapingJobs {
    Table,
    Id,
    JobType,
    Source,
    Params,
    Status,
    ItemsFound,
    ItemsProcessed,
    IsRecurring,
    Schedule,
    ScheduledAt,
    StartedAt,
    CompletedAt,
    Error,
    Result,
    CreatedAt,
}
