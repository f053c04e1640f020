//! Sync orchestration: per-horse multi-source sync and batch passes.
//!
//! # Module Structure
//!
//! - [`types`] - `SyncOptions`, result shapes, `SyncError`, policy constants
//! - [`engine`] - the [`SyncEngine`] orchestrator

pub mod engine;
mod types;

pub use engine::SyncEngine;
pub use types::{
    BatchSyncResult, HorseSyncResult, MarketRefreshResult, SyncError, SyncOptions,
    DEFAULT_BATCH_LIMIT, DEFAULT_PACING_DELAY, DEFAULT_STALENESS_DAYS,
};
