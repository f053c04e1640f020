//! Common re-exports for convenient entity usage.

pub use super::data_source::DataSource;
pub use super::fetch_cache::{
    ActiveModel as FetchCacheActiveModel, Column as FetchCacheColumn, DataType,
    Entity as FetchCache, Model as FetchCacheModel,
};
pub use super::horse::{
    ActiveModel as HorseActiveModel, Column as HorseColumn, Entity as Horse, Model as HorseModel,
};
pub use super::scraping_job::{
    ActiveModel as ScrapingJobActiveModel, Column as ScrapingJobColumn, Entity as ScrapingJob,
    JobStatus, JobType, Model as ScrapingJobModel,
};
pub use super::sync_status::SyncStatus;
pub use super::timeline_entry::{
    ActiveModel as TimelineEntryActiveModel, Column as TimelineEntryColumn, EntryType,
    Entity as TimelineEntry, Model as TimelineEntryModel,
};
