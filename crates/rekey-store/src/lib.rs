//! # rekey-store
//!
//! Transactional persistence for in-progress key rotations: the
//! `principals`/`acl`/`keys` tables described in spec, and the
//! [`store::RotationStore`] handle that wraps every handler's access
//! to them in the single-writer transactions the protocol's
//! concurrency model requires.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod models;
pub mod store;

pub use error::StoreError;
pub use models::{AclStatus, CommitAck, KeyEntry, PrincipalKeys};
pub use store::RotationStore;
