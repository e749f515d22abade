//! # rekey-transport
//!
//! Connection-level plumbing over an authenticated TLS stream:
//! [`connection::Connection`] frames one opcode and one payload per
//! message, and [`channel_binding::ChannelBinding`] derives the
//! session-bound material the authentication state machine signs and
//! verifies during the `AUTHCHAN` step.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod channel_binding;
pub mod connection;
pub mod error;

pub use channel_binding::ChannelBinding;
pub use connection::{Connection, Frame};
pub use error::TransportError;
