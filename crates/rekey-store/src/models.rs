//! Row types returned by [`crate::store::RotationStore`].

/// One host's ACL progress for a rotation, as reported by `STATUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclStatus {
    /// The target hostname.
    pub hostname: String,
    /// Whether `GETKEYS` has ever been served for this host.
    pub attempted: bool,
    /// Whether `COMMITKEY` has been acknowledged for this host.
    pub complete: bool,
}

/// One enctype's generated key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Kerberos encryption type number.
    pub enctype: i64,
    /// Raw key bytes.
    pub key: Vec<u8>,
}

/// The keys and metadata for one principal's in-progress rotation, as
/// returned to a host by `GETKEYS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalKeys {
    /// The principal's store row id.
    pub id: i64,
    /// The principal's Kerberos name.
    pub name: String,
    /// The new key-version number being installed.
    pub kvno: i64,
    /// The generated keys for this rotation.
    pub keys: Vec<KeyEntry>,
}

/// The outcome of acknowledging a host's key installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAck {
    /// Other hosts still have incomplete ACL rows; nothing more to do.
    Pending,
    /// This was the last host to acknowledge; the caller must now push
    /// the new keys to KDB and finalize the rotation.
    LastAcknowledger {
        /// The principal's store row id, for the finalization step.
        principal_id: i64,
    },
}
