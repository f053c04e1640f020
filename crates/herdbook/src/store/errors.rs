use sea_orm::DbErr;
use thiserror::Error;

/// Errors from the canonical persistence layer.
///
/// Unlike adapter failures these are not absorbed: a store error fails the
/// current horse's sync (which the next scheduled pass retries) and is the
/// one error class that propagates out of reconciliation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A referenced record does not exist.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// A write was attempted with missing or inconsistent fields.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a not-found error.
    #[inline]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create an invalid-input error.
    #[inline]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
