use thiserror::Error;

/// Errors that can occur while talking to an external source.
///
/// None of these escape an adapter: [`fetch`](super::SourceAdapter::fetch)
/// absorbs every variant into a typed absence. The enum exists so the
/// absorption site knows what it is absorbing.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The per-call timeout elapsed before the provider answered.
    #[error("timeout")]
    Timeout,

    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// The response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// Create a parse error.
    #[inline]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

/// Result type for raw provider calls, before absorption.
///
/// `Ok(None)` means the provider genuinely has no data for the identifier
/// (e.g. a 404) - that is not an error and never appears in sync results.
pub type FetchResult<T> = std::result::Result<Option<T>, SourceError>;
