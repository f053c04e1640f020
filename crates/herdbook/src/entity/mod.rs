//! SeaORM entity definitions for the herdbook database schema.

pub mod data_source;
pub mod fetch_cache;
pub mod horse;
pub mod prelude;
pub mod scraping_job;
pub mod sync_status;
pub mod timeline_entry;
