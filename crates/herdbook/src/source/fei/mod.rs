//! FEI competition registry adapter.
//!
//! Serves registry profiles (ownership history), historical competition
//! results, and uncached live results for horses carrying an FEI passport
//! number.

mod client;
mod convert;
mod types;

pub use client::{FeiClient, DEFAULT_HOST};
