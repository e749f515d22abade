//! # rekey-wire
//!
//! Wire framing for the key-rotation protocol: the cursor-based
//! [`Buffer`] that every handler reads its arguments from and writes
//! its results to, the [`Opcode`]/[`Response`]/[`ErrorCode`] enums that
//! label a message, and the Kerberos encryption-type constants used to
//! describe generated key material.
//!
//! A message on the wire is `u32 opcode || Buffer`, with no other
//! framing; `rekey-transport` is responsible for reading and writing
//! that shape over an authenticated connection.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod enctype;
pub mod error;
pub mod flags;
pub mod opcode;

pub use buffer::Buffer;
pub use enctype::enctype as enctypes;
pub use enctype::EnctypeProfile;
pub use error::WireError;
pub use opcode::{ErrorCode, Opcode, Response};
