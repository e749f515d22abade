//! # rekey-testing
//!
//! Shared test fixtures for the rekeysrv workspace, mirroring the
//! teacher's own `mssql-testing` crate: fixtures live in their own
//! workspace member, consumed as a dev-dependency by whatever crate
//! needs them, rather than duplicated per-crate.
//!
//! - [`memory_store`] — an in-memory `RotationStore`, migrated and
//!   ready to use.
//! - [`FakeKdb`] — an in-memory [`KdbAdmin`] double, so tests can drive
//!   `COMMITKEY`'s KDB interaction without a real KDC.
//! - [`loopback`] — a `tokio::io::duplex`-backed pair of framed
//!   connections, for driving the session loop end-to-end without a
//!   real socket.

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use rekey_kdb::{error::Result as KdbResult, KdbAdmin, KdbError, KeySetEntry};
use rekey_store::RotationStore;
use rekey_transport::Connection;
use tokio::io::DuplexStream;

/// Open a fresh in-memory [`RotationStore`] with migrations applied.
pub async fn memory_store() -> RotationStore {
    RotationStore::in_memory()
        .await
        .expect("in-memory sqlite store")
}

/// Default buffer size for [`loopback`]'s duplex stream.
pub const LOOPBACK_BUF: usize = 64 * 1024;

/// A pair of framed connections joined by an in-process duplex pipe,
/// standing in for a real TCP/TLS socket pair in tests that drive the
/// session loop directly.
#[must_use]
pub fn loopback() -> (Connection<DuplexStream>, Connection<DuplexStream>) {
    let (a, b) = tokio::io::duplex(LOOPBACK_BUF);
    (Connection::new(a), Connection::new(b))
}

#[derive(Debug, Clone)]
struct FakePrincipal {
    kvno: i64,
}

/// An in-memory [`KdbAdmin`] double.
///
/// Seed it with [`FakeKdb::with_kvno`] to simulate a principal that
/// already exists in KDB at a given kvno; [`FakeKdb::commit_keys`]
/// calls that succeed bump the stored kvno so a second `COMMITKEY`
/// pass observes the new value, the way a real KDC would.
#[derive(Debug, Default)]
pub struct FakeKdb {
    principals: Mutex<HashMap<String, FakePrincipal>>,
    committed: Mutex<Option<Vec<KeySetEntry>>>,
}

impl FakeKdb {
    /// An empty fake: every principal is reported not-found until
    /// seeded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `principal` as existing in KDB at `kvno`.
    #[must_use]
    pub fn with_kvno(self, principal: impl Into<String>, kvno: i64) -> Self {
        self.principals
            .lock()
            .expect("fake kdb lock")
            .insert(principal.into(), FakePrincipal { kvno });
        self
    }

    /// Remove `principal` from the fake, simulating it having
    /// disappeared from KDB between lookup and commit.
    pub fn forget(&self, principal: &str) {
        self.principals.lock().expect("fake kdb lock").remove(principal);
    }

    /// The key material last committed for `principal`, if any.
    #[must_use]
    pub fn last_committed_keys(&self, _principal: &str) -> Option<Vec<KeySetEntry>> {
        self.committed.lock().expect("fake kdb lock").clone()
    }
}

#[async_trait::async_trait]
impl KdbAdmin for FakeKdb {
    async fn current_kvno(&self, principal: &str) -> KdbResult<i64> {
        self.principals
            .lock()
            .expect("fake kdb lock")
            .get(principal)
            .map(|p| p.kvno)
            .ok_or(KdbError::NotFound)
    }

    async fn commit_keys(&self, principal: &str, new_kvno: i64, keys: &[KeySetEntry]) -> KdbResult<()> {
        let mut principals = self.principals.lock().expect("fake kdb lock");
        let entry = principals.get_mut(principal).ok_or(KdbError::NotFound)?;
        entry.kvno = new_kvno;
        drop(principals);
        *self.committed.lock().expect("fake kdb lock") = Some(keys.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rekey_wire::{Buffer, Opcode};

    #[tokio::test]
    async fn loopback_carries_a_frame_between_ends() {
        let (mut client, mut server) = loopback();
        let mut body = Buffer::new();
        body.put_str("svc/db@EXAMPLE.ORG");
        client.write_frame(Opcode::Status.as_u32(), &body).await.unwrap();

        let (opcode, mut received) = server.read_request().await.unwrap().unwrap();
        assert_eq!(opcode, Opcode::Status);
        assert_eq!(received.get_str().unwrap(), "svc/db@EXAMPLE.ORG");
    }

    #[tokio::test]
    async fn fake_kdb_reports_not_found_until_seeded() {
        let fake = FakeKdb::new();
        assert!(fake.current_kvno("svc/db@EXAMPLE.ORG").await.is_err());

        let fake = fake.with_kvno("svc/db@EXAMPLE.ORG", 6);
        assert_eq!(fake.current_kvno("svc/db@EXAMPLE.ORG").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn fake_kdb_commit_keys_bumps_kvno_and_records_keys() {
        let fake = FakeKdb::new().with_kvno("svc/db@EXAMPLE.ORG", 6);
        fake.commit_keys("svc/db@EXAMPLE.ORG", 7, &[(18, vec![1, 2, 3])])
            .await
            .unwrap();
        assert_eq!(fake.current_kvno("svc/db@EXAMPLE.ORG").await.unwrap(), 7);
        assert_eq!(
            fake.last_committed_keys("svc/db@EXAMPLE.ORG"),
            Some(vec![(18, vec![1, 2, 3])])
        );
    }

    #[tokio::test]
    async fn memory_store_is_ready_for_use() {
        let store = memory_store().await;
        assert!(!store.rotation_exists("nobody@EXAMPLE.ORG").await.unwrap());
    }
}
