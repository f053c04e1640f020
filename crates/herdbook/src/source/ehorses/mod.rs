//! ehorses marketplace adapter.
//!
//! ehorses has no API; listing pages are fetched as HTML and parsed with
//! structural selectors into sale entries. Of the three sources this one is
//! the most fragile, which is why everything brittle lives in `convert` and
//! the client itself stays a plain page fetcher.

mod client;
mod convert;

pub use client::{EhorsesClient, DEFAULT_HOST};
