//! Transport-level error types.

use thiserror::Error;

/// Errors raised while framing messages over a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying I/O stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The message header or body did not parse.
    #[error("wire error: {0}")]
    Wire(#[from] rekey_wire::WireError),

    /// The peer closed the connection before a complete message arrived.
    #[error("connection closed mid-message")]
    ConnectionClosed,

    /// The TLS session has not completed a handshake, so no keying
    /// material is available for channel binding.
    #[error("TLS handshake not complete")]
    HandshakeIncomplete,
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
