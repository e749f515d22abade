//! Wire-level error types.

use thiserror::Error;

/// Errors raised while decoding or encoding a wire buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A read walked past the end of the buffer.
    #[error("truncated message: wanted {wanted} bytes, {available} remained")]
    Truncated {
        /// Bytes the read attempted to consume.
        wanted: usize,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },

    /// A length-prefixed field declared a length larger than the
    /// configured maximum, before any attempt to read that many bytes.
    #[error("field length {len} exceeds maximum {max}")]
    LengthTooLarge {
        /// Declared length.
        len: u32,
        /// Configured maximum.
        max: u32,
    },

    /// A byte string field was not valid UTF-8.
    #[error("field is not valid UTF-8")]
    NotUtf8,

    /// An opcode byte did not correspond to a known opcode.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),
}

/// Result type for wire codec operations.
pub type Result<T> = std::result::Result<T, WireError>;
