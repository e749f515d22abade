//! Per-opcode flag-word bit constants.
//!
//! Each opcode that carries a flag word defines its own bits starting
//! from bit 0; there is no shared flag namespace across opcodes.

/// `AUTH` flag word: the client expects another round trip and is
/// prepared to receive a continuation token.
pub const AUTH_MORE: u32 = 0x0000_0001;

/// `NEWREQ` flag word: generate only the single-entry DES-CBC-CRC
/// enctype set for this rotation, regardless of the server's
/// configured [`crate::EnctypeProfile`].
pub const NEWREQ_DESONLY: u32 = 0x0000_0001;

/// `STATUS` per-host flag word bits. OR'd together — see spec's
/// documented fix for the original's flag-overwrite defect (§4.5):
/// a host that is both attempted and complete reports both bits set.
pub mod status {
    /// `GETKEYS` has been served at least once for this host.
    pub const ATTEMPTED: u32 = 0x0000_0001;
    /// `COMMITKEY` has been acknowledged for this host.
    pub const COMPLETE: u32 = 0x0000_0002;
}
