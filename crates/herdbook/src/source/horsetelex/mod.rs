//! HorseTelex pedigree database adapter.
//!
//! Serves pedigree data (registered offspring become breeding entries) and
//! published breeding-value indices for horses with a HorseTelex id.

mod client;
mod convert;
mod types;

pub use client::{HorsetelexClient, DEFAULT_HOST};
