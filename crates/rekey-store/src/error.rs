//! Rotation store error types.

use thiserror::Error;

/// Errors raised while reading or mutating the rotation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQL engine rejected a statement or a connection
    /// could not be acquired.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// `NEWREQ` was issued for a principal that already has a rotation
    /// in progress.
    #[error("rekey for this principal already in progress")]
    AlreadyInProgress,

    /// No rotation record matches the requested `(name, kvno)` or
    /// `name` alone, depending on the caller.
    #[error("no matching rotation record")]
    NotFound,
}

/// Result type for rotation store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
