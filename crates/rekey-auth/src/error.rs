//! Authentication and authorization error types.

use thiserror::Error;

/// Errors raised while driving the GSS acceptor or classifying a
/// principal.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The GSSAPI library rejected a call (bad token, expired
    /// credential, mechanism mismatch, ...).
    #[error("GSSAPI error: {0}")]
    Gss(String),

    /// The security context completed, but without the mutual
    /// authentication and integrity flags this protocol requires.
    #[error("GSS context is missing required flags (have mutual={mutual}, integrity={integrity})")]
    MissingFlags {
        /// Whether `GSS_C_MUTUAL_FLAG` was negotiated.
        mutual: bool,
        /// Whether `GSS_C_INTEG_FLAG` was negotiated.
        integrity: bool,
    },

    /// `step` was called again after the handshake already completed.
    #[error("authentication already complete")]
    AlreadyComplete,

    /// `step` was called before the context was initialized, or a MIC
    /// operation was attempted before the handshake completed.
    #[error("GSS context not established yet")]
    NotEstablished,

    /// The exported name blob did not match the expected header shape.
    #[error("malformed exported GSS name: {0}")]
    MalformedName(&'static str),

    /// MIC verification failed: the token did not match the expected
    /// channel-binding material, or was corrupt.
    #[error("MIC verification failed")]
    BadMic,
}

/// Result type for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
