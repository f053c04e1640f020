//! Herdbook - multi-registry horse profile synchronization.
//!
//! This library ingests horse data from independent external registries and
//! marketplaces (FEI, HorseTelex, ehorses), merges it into a canonical local
//! store, and keeps the merge fresh on a recurring schedule without
//! overwhelming the providers.
//!
//! The moving parts, leaves first:
//!
//! - [`cache`] - durable fetch cache with TTLs and lazy staleness
//! - [`rate_limit`] - per-source sliding-window throttle
//! - [`source`] - per-provider adapters behind a uniform fetch contract
//! - [`reconcile`] - dedup/merge of adapter output into timeline entries
//! - [`sync`] - per-horse orchestration and sequential batch passes
//! - [`scheduler`] / [`jobs`] - recurring duties and the scrape job queue
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use herdbook::{connect_and_migrate, SourceRateLimiter, SyncEngine, SyncOptions};
//! use herdbook::source::{ehorses::EhorsesClient, fei::FeiClient};
//!
//! let db = Arc::new(connect_and_migrate("sqlite://herdbook.db?mode=rwc").await?);
//! let engine = SyncEngine::new(
//!     db,
//!     SourceRateLimiter::new(),
//!     vec![Arc::new(FeiClient::new(&token)), Arc::new(EhorsesClient::new())],
//!     SyncOptions::default(),
//! );
//! let result = engine.sync_horse(horse_id).await?;
//! println!("added {} entries", result.added);
//! ```

pub mod cache;
pub mod db;
pub mod entity;
pub mod http;
pub mod jobs;
pub mod migration;
pub mod rate_limit;
pub mod reconcile;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod sync;

pub use db::{connect, connect_and_migrate};
pub use entity::prelude::*;
pub use jobs::{DrainSummary, JobRunner};
pub use rate_limit::SourceRateLimiter;
pub use reconcile::{reconcile, timeline, ReconcileStats};
pub use scheduler::{Cadence, Scheduler, SchedulerConfig, SchedulerHandle};
pub use source::{Absence, CandidateRecord, FetchContext, FetchOutcome, SourceAdapter};
pub use store::StoreError;
pub use sync::{BatchSyncResult, HorseSyncResult, SyncEngine, SyncError, SyncOptions};
