//! Dispatcher-facing error type.
//!
//! Every handler returns `Result<Outcome, HandlerError>`
//! (see [`crate::dispatch::Outcome`]); [`HandlerError`] folds spec's
//! "Propagation" rules (non-fatal errors reply `ERROR` and keep the
//! session alive, fatal errors reply `ERROR` and terminate it) into
//! one type instead of scattering `goto`-style flags the way the
//! original C does.

use rekey_auth::AuthError;
use rekey_kdb::KdbError;
use rekey_store::StoreError;
use rekey_transport::TransportError;
use rekey_wire::{ErrorCode, WireError};

/// An error raised while handling one request.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Reply `ERROR` with `code`/`message` and keep the session alive.
    #[error("{code:?}: {message}")]
    NonFatal {
        /// The wire error code to report.
        code: ErrorCode,
        /// Human-readable detail, logged and sent to the client.
        message: String,
    },

    /// Reply `ERROR` with `code`/`message`, then terminate the session:
    /// an acceptor inconsistency, a channel-binding failure after a
    /// valid GSS context, or other unrecoverable state.
    #[error("fatal {code:?}: {message}")]
    Fatal {
        /// The wire error code to report.
        code: ErrorCode,
        /// Human-readable detail, logged and sent to the client.
        message: String,
    },

    /// The transport itself failed (I/O error, malformed frame). There
    /// is no peer left to reply to; the session loop just exits.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl HandlerError {
    /// Build a non-fatal error.
    pub fn non_fatal(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NonFatal {
            code,
            message: message.into(),
        }
    }

    /// Build a fatal error.
    pub fn fatal(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Fatal {
            code,
            message: message.into(),
        }
    }

    /// The wire error code to report, if this error has a wire
    /// representation (a pure transport failure does not).
    #[must_use]
    pub fn wire_code(&self) -> Option<ErrorCode> {
        match self {
            Self::NonFatal { code, .. } | Self::Fatal { code, .. } => Some(*code),
            Self::Transport(_) => None,
        }
    }

    /// The message to send on the wire and log.
    #[must_use]
    pub fn wire_message(&self) -> String {
        match self {
            Self::NonFatal { message, .. } | Self::Fatal { message, .. } => message.clone(),
            Self::Transport(e) => e.to_string(),
        }
    }

    /// Whether this error should terminate the session after (if
    /// possible) replying.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. } | Self::Transport(_))
    }
}

impl From<StoreError> for HandlerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyInProgress => {
                Self::non_fatal(ErrorCode::Other, "Rekey for this principal already in progress")
            }
            StoreError::NotFound => Self::non_fatal(ErrorCode::NotFound, e.to_string()),
            StoreError::Database(_) => Self::non_fatal(ErrorCode::Other, e.to_string()),
        }
    }
}

impl From<KdbError> for HandlerError {
    fn from(e: KdbError) -> Self {
        match e {
            KdbError::NotFound => Self::non_fatal(ErrorCode::NotFound, e.to_string()),
            other => Self::non_fatal(ErrorCode::Other, other.to_string()),
        }
    }
}

impl From<WireError> for HandlerError {
    fn from(e: WireError) -> Self {
        Self::non_fatal(ErrorCode::BadReq, e.to_string())
    }
}

impl From<AuthError> for HandlerError {
    fn from(e: AuthError) -> Self {
        Self::non_fatal(ErrorCode::AuthN, e.to_string())
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;
