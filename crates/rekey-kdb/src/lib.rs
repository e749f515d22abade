//! # rekey-kdb
//!
//! A thin bridge to the Kerberos administrative database (KDB): "what
//! is this principal's current kvno" and "atomically replace this
//! principal's key set at a new kvno". We bind an external
//! administrative interface here, we do not reimplement it — see
//! [`process::ProcessKdb`] for the concrete adapter that shells out to
//! a `kadmin`-style CLI.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod process;

pub use error::KdbError;

/// One enctype's key material, as pushed to KDB on a final commit.
pub type KeySetEntry = (i64, Vec<u8>);

/// Abstraction over the KDB administrative interface, so `rekey-server`
/// never shells a process directly and tests can substitute an
/// in-memory fake (see `rekey-testing::FakeKdb`).
#[async_trait::async_trait]
pub trait KdbAdmin: Send + Sync {
    /// Look up `principal`'s current key-version number.
    ///
    /// `Err(KdbError::NotFound)` if the principal does not exist.
    async fn current_kvno(&self, principal: &str) -> error::Result<i64>;

    /// Atomically replace `principal`'s key set with `keys` at
    /// `new_kvno`.
    ///
    /// `Err(KdbError::NotFound)` if the principal disappeared since the
    /// caller last looked it up.
    async fn commit_keys(
        &self,
        principal: &str,
        new_kvno: i64,
        keys: &[KeySetEntry],
    ) -> error::Result<()>;
}
