//! # rekey-auth
//!
//! The connection-scoped authentication state machine and authorization
//! classifier: an acceptor-side GSS security context
//! ([`acceptor::Acceptor`]), the exported-name parser that turns a
//! completed context into a [`principal::KerberosPrincipal`], and the
//! classifier ([`classifier::classify`]) that derives `is_host`/
//! `is_admin` from it.
//!
//! This crate deliberately knows nothing about the wire protocol or
//! the opcode dispatcher — `rekey-server` drives `Acceptor` and
//! `classify` from its `AUTH`/`AUTHCHAN` handlers and owns `authstate`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod acceptor;
pub mod classifier;
pub mod error;
pub mod exported_name;
pub mod principal;

pub use acceptor::{Acceptor, StepOutcome};
pub use classifier::{classify, Authorization};
pub use error::AuthError;
pub use principal::KerberosPrincipal;
