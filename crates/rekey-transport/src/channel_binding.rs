//! Channel-binding material derived from the TLS session.
//!
//! The original protocol binds the GSS security context to the literal
//! bytes of the TLS "Finished" messages exchanged during the handshake
//! (`SSL_get_finished`/`SSL_get_peer_finished`): each side proves it
//! terminated the *same* TLS session as its peer by exchanging a MIC
//! computed over those bytes. `rustls` does not expose raw Finished
//! messages. [`ChannelBinding`] instead exports channel-binding
//! material via the RFC 5705/9266 TLS exporter
//! (`export_keying_material`), which serves the same purpose — a value
//! both ends of one TLS session can compute, and no one else can — with
//! a different derivation.
//!
//! The asymmetry of the original protocol is preserved: the acceptor
//! verifies a MIC over one ordering of (local, peer) material and
//! replies with a MIC over the reverse ordering, so a reflected token
//! cannot pass for a reply.

use crate::error::{Result, TransportError};

const EXPORTER_LABEL: &[u8] = b"EXPORTER-rekeysrv-channel-binding";
const EXPORTER_LEN: usize = 32;

/// Anything that can produce RFC 5705/9266 exported keying material for
/// its current session — implemented for both `rustls::ServerConnection`
/// and `rustls::ClientConnection`, so [`ChannelBinding`] doesn't need to
/// know which side of the handshake it is running on.
pub trait ExportsKeyingMaterial {
    /// Derive `output.len()` bytes of keying material bound to this
    /// session, `label`, and optional `context`.
    fn export(&self, output: &mut [u8], label: &[u8], context: Option<&[u8]>) -> Result<()>;
}

impl ExportsKeyingMaterial for rustls::ServerConnection {
    fn export(&self, output: &mut [u8], label: &[u8], context: Option<&[u8]>) -> Result<()> {
        self.export_keying_material(output, label, context)
            .map_err(|_| TransportError::HandshakeIncomplete)
    }
}

impl ExportsKeyingMaterial for rustls::ClientConnection {
    fn export(&self, output: &mut [u8], label: &[u8], context: Option<&[u8]>) -> Result<()> {
        self.export_keying_material(output, label, context)
            .map_err(|_| TransportError::HandshakeIncomplete)
    }
}

/// Channel-binding material for one TLS session, in both orderings
/// the protocol needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    local_then_peer: Vec<u8>,
    peer_then_local: Vec<u8>,
}

impl ChannelBinding {
    /// Derive channel-binding material from a completed TLS connection.
    ///
    /// Returns [`TransportError::HandshakeIncomplete`] if the exporter
    /// is not yet available (handshake still in progress).
    pub fn from_connection<C>(conn: &C) -> Result<Self>
    where
        C: ExportsKeyingMaterial,
    {
        let mut local = [0u8; EXPORTER_LEN];
        let mut peer = [0u8; EXPORTER_LEN];
        conn.export(&mut local, EXPORTER_LABEL, Some(b"local"))?;
        conn.export(&mut peer, EXPORTER_LABEL, Some(b"peer"))?;

        let mut local_then_peer = Vec::with_capacity(EXPORTER_LEN * 2);
        local_then_peer.extend_from_slice(&local);
        local_then_peer.extend_from_slice(&peer);

        let mut peer_then_local = Vec::with_capacity(EXPORTER_LEN * 2);
        peer_then_local.extend_from_slice(&peer);
        peer_then_local.extend_from_slice(&local);

        Ok(Self {
            local_then_peer,
            peer_then_local,
        })
    }

    /// The ordering the acceptor verifies the client's `AUTHCHAN` MIC
    /// against: peer material followed by local material.
    #[must_use]
    pub fn verification_bytes(&self) -> &[u8] {
        &self.peer_then_local
    }

    /// The ordering the acceptor signs its reply MIC over: local
    /// material followed by peer material (the reverse of what it
    /// verified).
    #[must_use]
    pub fn reply_bytes(&self) -> &[u8] {
        &self.local_then_peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        local: [u8; EXPORTER_LEN],
        peer: [u8; EXPORTER_LEN],
    }

    impl ExportsKeyingMaterial for Fake {
        fn export(&self, output: &mut [u8], _label: &[u8], context: Option<&[u8]>) -> Result<()> {
            output.copy_from_slice(match context {
                Some(b"local") => &self.local,
                Some(b"peer") => &self.peer,
                _ => unreachable!("test only exercises local/peer contexts"),
            });
            Ok(())
        }
    }

    #[test]
    fn verification_and_reply_bytes_are_reverse_orderings() {
        let fake = Fake {
            local: [1u8; EXPORTER_LEN],
            peer: [2u8; EXPORTER_LEN],
        };
        let binding = ChannelBinding::from_connection(&fake).unwrap();

        let mut expected_reply = vec![1u8; EXPORTER_LEN];
        expected_reply.extend(vec![2u8; EXPORTER_LEN]);
        assert_eq!(binding.reply_bytes(), expected_reply.as_slice());

        let mut expected_verify = vec![2u8; EXPORTER_LEN];
        expected_verify.extend(vec![1u8; EXPORTER_LEN]);
        assert_eq!(binding.verification_bytes(), expected_verify.as_slice());

        assert_ne!(binding.verification_bytes(), binding.reply_bytes());
    }
}
