//! Parser for the GSS mechanism-independent exported-name format
//! (RFC 2743 §3.2), restricted to the one shape `AUTH` ever sends us:
//! a Kerberos V5 name.
//!
//! Wire shape:
//!
//! ```text
//! 04 01                     -- fixed token identifier (TOK-ID)
//! NN NN                     -- u16 big-endian length of the MECH-OID DER that follows
//! 06 LL <oid bytes>         -- DER-encoded OID, LL < 128 (short-form length)
//! NN NN NN NN               -- u32 big-endian length of the name that follows
//! <name bytes>              -- UTF-8 principal text, e.g. "alice/admin@EXAMPLE.ORG"
//! ```
//!
//! Anything that doesn't match this exactly — wrong token id, a
//! long-form DER length, an OID other than Kerberos V5, a truncated
//! buffer — is rejected. A handshake that produces a name in this
//! shape but for a different mechanism has no business being accepted
//! as a Kerberos principal in the first place.

use crate::error::AuthError;

/// DER encoding of the Kerberos V5 OID, `1.2.840.113554.1.2.2`.
const KRB5_MECH_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x12, 0x01, 0x02, 0x02];

/// Validate and decode an exported GSS name into its principal text.
pub fn decode(buf: &[u8]) -> Result<String, AuthError> {
    let mut pos = 0usize;
    let take = |pos: &mut usize, n: usize| -> Result<&[u8], AuthError> {
        let end = pos
            .checked_add(n)
            .filter(|&end| end <= buf.len())
            .ok_or(AuthError::MalformedName("exported name truncated"))?;
        let slice = &buf[*pos..end];
        *pos = end;
        Ok(slice)
    };

    let tok_id = take(&mut pos, 2)?;
    if tok_id != [0x04, 0x01] {
        return Err(AuthError::MalformedName("unexpected token identifier"));
    }

    let oid_len = u16::from_be_bytes(take(&mut pos, 2)?.try_into().expect("len checked")) as usize;
    let oid_der = take(&mut pos, oid_len)?;

    let tag = oid_der
        .first()
        .copied()
        .ok_or(AuthError::MalformedName("empty OID wrapper"))?;
    if tag != 0x06 {
        return Err(AuthError::MalformedName("OID wrapper has wrong DER tag"));
    }
    let der_len = *oid_der
        .get(1)
        .ok_or(AuthError::MalformedName("OID wrapper missing length byte"))?;
    if der_len >= 128 {
        return Err(AuthError::MalformedName("OID length is not short-form"));
    }
    let oid_bytes = oid_der
        .get(2..2 + der_len as usize)
        .ok_or(AuthError::MalformedName("OID wrapper length overruns buffer"))?;
    if oid_bytes != KRB5_MECH_OID {
        return Err(AuthError::MalformedName("exported name is not Kerberos V5"));
    }

    let name_len = u32::from_be_bytes(take(&mut pos, 4)?.try_into().expect("len checked")) as usize;
    let name_bytes = take(&mut pos, name_len)?;
    String::from_utf8(name_bytes.to_vec())
        .map_err(|_| AuthError::MalformedName("principal text is not UTF-8"))
}

/// Build a well-formed exported-name buffer, for tests and for anyone
/// that needs to construct a fixture matching what a real GSS library
/// would have exported.
#[must_use]
pub fn encode(principal_text: &str) -> Vec<u8> {
    let mut out = vec![0x04, 0x01];
    out.extend_from_slice(&(2 + KRB5_MECH_OID.len() as u16).to_be_bytes());
    out.push(0x06);
    out.push(KRB5_MECH_OID.len() as u8);
    out.extend_from_slice(KRB5_MECH_OID);
    out.extend_from_slice(&(principal_text.len() as u32).to_be_bytes());
    out.extend_from_slice(principal_text.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_well_formed_name() {
        let buf = encode("alice/admin@EXAMPLE.ORG");
        assert_eq!(decode(&buf).unwrap(), "alice/admin@EXAMPLE.ORG");
    }

    #[test]
    fn rejects_wrong_token_id() {
        let mut buf = encode("svc@EXAMPLE.ORG");
        buf[1] = 0x02;
        assert!(decode(&buf).is_err());
    }

    #[test]
    fn rejects_non_krb5_oid() {
        let mut buf = encode("svc@EXAMPLE.ORG");
        // Flip a byte inside the OID body.
        buf[6] ^= 0xff;
        assert!(decode(&buf).is_err());
    }

    #[test]
    fn rejects_long_form_der_length() {
        let mut buf = encode("svc@EXAMPLE.ORG");
        // The DER length byte sits right after the 0x06 tag.
        let tag_pos = 4;
        assert_eq!(buf[tag_pos], 0x06);
        buf[tag_pos + 1] |= 0x80;
        assert!(decode(&buf).is_err());
    }

    #[test]
    fn rejects_truncated_buffer() {
        let buf = encode("svc@EXAMPLE.ORG");
        assert!(decode(&buf[..buf.len() - 3]).is_err());
    }
}
