//! The rotation store: SQLite-backed, transactional persistence of
//! principals under rotation, their ACL rows, and their candidate
//! keys.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::models::{AclStatus, CommitAck, KeyEntry, PrincipalKeys};

/// A handle to the rotation store, backed by a pooled SQLite
/// connection. Cheaply cloneable — clones share the same pool.
#[derive(Debug, Clone)]
pub struct RotationStore {
    pool: SqlitePool,
}

impl RotationStore {
    /// Open (creating if needed) the SQLite database at `path` and run
    /// pending migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(path)
            .map_err(sqlx::Error::from)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Open a private, in-memory database. Used by tests and by
    /// `rekey-testing`'s fixtures.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Create a new rotation record for `name`: a principal row at
    /// `kvno`, one ACL row per hostname, and one key row per generated
    /// key. All in a single transaction — partial failure leaves no
    /// trace.
    ///
    /// Returns [`StoreError::AlreadyInProgress`] if a rotation for
    /// `name` already exists; the transaction is rolled back in that
    /// case as in every other error path.
    pub async fn new_rotation(
        &self,
        name: &str,
        kvno: i64,
        hostnames: &[String],
        keys: &[(i64, Vec<u8>)],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let insert = sqlx::query("INSERT INTO principals (name, kvno) VALUES (?1, ?2)")
            .bind(name)
            .bind(kvno)
            .execute(&mut *tx)
            .await;
        let principal_id = match insert {
            Ok(result) => result.last_insert_rowid(),
            Err(e) => {
                tx.rollback().await.ok();
                return Err(if is_unique_violation(&e) {
                    StoreError::AlreadyInProgress
                } else {
                    e.into()
                });
            }
        };

        for hostname in hostnames {
            sqlx::query("INSERT INTO acl (principal, hostname) VALUES (?1, ?2)")
                .bind(principal_id)
                .bind(hostname)
                .execute(&mut *tx)
                .await?;
        }

        for (enctype, key) in keys {
            sqlx::query("INSERT INTO keys (principal, enctype, key) VALUES (?1, ?2, ?3)")
                .bind(principal_id)
                .bind(enctype)
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Whether a rotation for `name` already exists, regardless of its
    /// progress.
    pub async fn rotation_exists(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM principals WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// The ACL status of every host targeted by `name`'s rotation.
    /// `Err(StoreError::NotFound)` if no rotation exists for `name`.
    pub async fn status(&self, name: &str) -> Result<Vec<AclStatus>> {
        let principal_id: Option<i64> = sqlx::query("SELECT id FROM principals WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.get(0));
        let Some(principal_id) = principal_id else {
            return Err(StoreError::NotFound);
        };

        let rows = sqlx::query("SELECT hostname, attempted, complete FROM acl WHERE principal = ?1")
            .bind(principal_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| AclStatus {
                hostname: row.get(0),
                attempted: row.get::<i64, _>(1) != 0,
                complete: row.get::<i64, _>(2) != 0,
            })
            .collect())
    }

    /// Read and mark: for every rotation whose ACL contains `hostname`,
    /// return its keys, mark that host's ACL row `attempted`, and
    /// increment `downloadcount` — all inside one transaction, so two
    /// concurrent calls from the same host observe a monotonic
    /// `downloadcount`.
    pub async fn get_keys_for_host(&self, hostname: &str) -> Result<Vec<PrincipalKeys>> {
        let mut tx = self.pool.begin().await?;

        let principal_rows = sqlx::query(
            "SELECT p.id, p.name, p.kvno \
             FROM principals p JOIN acl a ON a.principal = p.id \
             WHERE a.hostname = ?1",
        )
        .bind(hostname)
        .fetch_all(&mut *tx)
        .await?;

        let mut out = Vec::with_capacity(principal_rows.len());
        for row in principal_rows {
            let id: i64 = row.get(0);
            let name: String = row.get(1);
            let kvno: i64 = row.get(2);

            let key_rows = sqlx::query("SELECT enctype, key FROM keys WHERE principal = ?1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
            let keys = key_rows
                .into_iter()
                .map(|r| KeyEntry {
                    enctype: r.get(0),
                    key: r.get(1),
                })
                .collect();

            sqlx::query("UPDATE acl SET attempted = 1 WHERE principal = ?1 AND hostname = ?2")
                .bind(id)
                .bind(hostname)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE principals SET downloadcount = downloadcount + 1 WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            out.push(PrincipalKeys { id, name, kvno, keys });
        }

        tx.commit().await?;
        Ok(out)
    }

    /// Acknowledge that `hostname` installed the keys for `(name,
    /// kvno)`: mark its ACL row complete, increment `commitcount`, and
    /// report whether every host for this rotation is now complete.
    ///
    /// `Err(StoreError::NotFound)` if no rotation matches `(name,
    /// kvno)` — the caller maps this to `AUTHZ` ("no rekey in
    /// progress"), per the protocol's wire taxonomy.
    pub async fn commit_ack(&self, name: &str, kvno: i64, hostname: &str) -> Result<CommitAck> {
        let mut tx = self.pool.begin().await?;

        let principal_id: Option<i64> =
            sqlx::query("SELECT id FROM principals WHERE name = ?1 AND kvno = ?2")
                .bind(name)
                .bind(kvno)
                .fetch_optional(&mut *tx)
                .await?
                .map(|row| row.get(0));
        let Some(principal_id) = principal_id else {
            tx.rollback().await.ok();
            return Err(StoreError::NotFound);
        };

        sqlx::query("UPDATE acl SET complete = 1 WHERE principal = ?1 AND hostname = ?2")
            .bind(principal_id)
            .bind(hostname)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE principals SET commitcount = commitcount + 1 WHERE id = ?1")
            .bind(principal_id)
            .execute(&mut *tx)
            .await?;

        let remaining: i64 = sqlx::query(
            "SELECT COUNT(*) FROM acl WHERE principal = ?1 AND complete = 0",
        )
        .bind(principal_id)
        .fetch_one(&mut *tx)
        .await?
        .get(0);

        tx.commit().await?;

        Ok(if remaining == 0 {
            CommitAck::LastAcknowledger { principal_id }
        } else {
            CommitAck::Pending
        })
    }

    /// All generated keys for one principal's rotation, by store id.
    pub async fn keys_for_principal(&self, principal_id: i64) -> Result<Vec<KeyEntry>> {
        let rows = sqlx::query("SELECT enctype, key FROM keys WHERE principal = ?1")
            .bind(principal_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| KeyEntry {
                enctype: r.get(0),
                key: r.get(1),
            })
            .collect())
    }

    /// Record a terminal message on a rotation (e.g. "kvno changed on
    /// kdc") for administrator inspection via `STATUS`'s underlying
    /// row. Does not delete the rotation.
    pub async fn record_terminal_message(&self, principal_id: i64, message: &str) -> Result<()> {
        sqlx::query("UPDATE principals SET message = ?1 WHERE id = ?2")
            .bind(message)
            .bind(principal_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete every key row, ACL row, and the principal row itself for
    /// one completed rotation. Idempotent: deleting a principal id that
    /// no longer exists (because a racing host already ran this) is a
    /// silent no-op, not an error — this is the harmless-retry path
    /// `COMMITKEY` step 9 requires.
    pub async fn delete_rotation(&self, principal_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM keys WHERE principal = ?1")
            .bind(principal_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM acl WHERE principal = ?1")
            .bind(principal_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM principals WHERE id = ?1")
            .bind(principal_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> RotationStore {
        RotationStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn new_rotation_then_status_reports_fresh_hosts() {
        let store = store().await;
        store
            .new_rotation(
                "svc/db@EXAMPLE.ORG",
                6,
                &["h1.example".to_string(), "h2.example".to_string()],
                &[(18, vec![1, 2, 3])],
            )
            .await
            .unwrap();

        let status = store.status("svc/db@EXAMPLE.ORG").await.unwrap();
        assert_eq!(status.len(), 2);
        assert!(status.iter().all(|s| !s.attempted && !s.complete));
    }

    #[tokio::test]
    async fn second_new_rotation_for_same_principal_fails() {
        let store = store().await;
        store
            .new_rotation("svc/db@EXAMPLE.ORG", 6, &["h1.example".to_string()], &[])
            .await
            .unwrap();

        let err = store
            .new_rotation("svc/db@EXAMPLE.ORG", 7, &["h1.example".to_string()], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInProgress));

        // Unchanged: still one principal, original kvno.
        let status = store.status("svc/db@EXAMPLE.ORG").await.unwrap();
        assert_eq!(status.len(), 1);
    }

    #[tokio::test]
    async fn status_for_unknown_principal_is_not_found() {
        let store = store().await;
        assert!(matches!(
            store.status("nobody@EXAMPLE.ORG").await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn get_keys_marks_attempted_and_increments_downloadcount_once_per_principal() {
        let store = store().await;
        store
            .new_rotation(
                "svc/db@EXAMPLE.ORG",
                6,
                &["h1.example".to_string()],
                &[(18, vec![1, 2, 3]), (17, vec![4, 5, 6])],
            )
            .await
            .unwrap();

        let result = store.get_keys_for_host("h1.example").await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].keys.len(), 2);

        let status = store.status("svc/db@EXAMPLE.ORG").await.unwrap();
        assert!(status[0].attempted);

        // A second host download increments downloadcount again for the
        // same principal, but only by one regardless of enctype count.
        store.get_keys_for_host("h1.example").await.unwrap();
        let again = store.get_keys_for_host("h1.example").await.unwrap();
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn commit_ack_reports_pending_until_last_host() {
        let store = store().await;
        store
            .new_rotation(
                "svc/db@EXAMPLE.ORG",
                6,
                &["h1.example".to_string(), "h2.example".to_string()],
                &[],
            )
            .await
            .unwrap();

        let first = store
            .commit_ack("svc/db@EXAMPLE.ORG", 6, "h1.example")
            .await
            .unwrap();
        assert!(matches!(first, CommitAck::Pending));

        let second = store
            .commit_ack("svc/db@EXAMPLE.ORG", 6, "h2.example")
            .await
            .unwrap();
        assert!(matches!(second, CommitAck::LastAcknowledger { .. }));
    }

    #[tokio::test]
    async fn commit_ack_wrong_kvno_is_not_found() {
        let store = store().await;
        store
            .new_rotation("svc/db@EXAMPLE.ORG", 6, &["h1.example".to_string()], &[])
            .await
            .unwrap();

        assert!(matches!(
            store
                .commit_ack("svc/db@EXAMPLE.ORG", 999, "h1.example")
                .await
                .unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn delete_rotation_is_idempotent() {
        let store = store().await;
        store
            .new_rotation("svc/db@EXAMPLE.ORG", 6, &["h1.example".to_string()], &[])
            .await
            .unwrap();
        let id = match store
            .commit_ack("svc/db@EXAMPLE.ORG", 6, "h1.example")
            .await
            .unwrap()
        {
            CommitAck::LastAcknowledger { principal_id } => principal_id,
            CommitAck::Pending => panic!("expected last acknowledger"),
        };

        store.delete_rotation(id).await.unwrap();
        assert!(matches!(
            store.status("svc/db@EXAMPLE.ORG").await.unwrap_err(),
            StoreError::NotFound
        ));

        // Racing second call on the same id is a harmless no-op.
        store.delete_rotation(id).await.unwrap();
    }
}
