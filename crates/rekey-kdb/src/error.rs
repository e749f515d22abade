//! KDB bridge error types.

use thiserror::Error;

/// Errors raised while talking to the Kerberos administrative
/// database.
#[derive(Debug, Error)]
pub enum KdbError {
    /// The principal does not exist in KDB.
    #[error("principal not found in kdb")]
    NotFound,

    /// The admin adapter process could not be spawned, or exited
    /// non-zero.
    #[error("kdb admin command failed: {0}")]
    CommandFailed(String),

    /// The adapter's output did not parse as expected.
    #[error("unexpected kdb admin output: {0}")]
    UnexpectedOutput(String),

    /// The underlying process I/O failed.
    #[error("I/O error spawning kdb admin command: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for KDB bridge operations.
pub type Result<T> = std::result::Result<T, KdbError>;
