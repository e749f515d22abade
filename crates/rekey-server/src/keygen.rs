//! Random keyblock generation for `NEWREQ`.
//!
//! The original links `krb5_generate_random_keyblock`; we have no
//! Kerberos key-derivation library in the dependency stack and none is
//! warranted here — a rekeyed principal's key is just
//! cryptographically random bytes of the correct length for its
//! enctype, which is exactly what `krb5_generate_random_keyblock` does
//! under the hood for every enctype this server issues.

use rand::RngCore;
use rekey_wire::{enctypes, EnctypeProfile};

/// The key length, in bytes, for one of the enctypes this server ever
/// generates or replicates.
#[must_use]
pub fn key_len(enctype: u32) -> usize {
    match enctype {
        enctypes::DES_CBC_CRC | enctypes::DES_CBC_MD4 | enctypes::DES_CBC_MD5 => 8,
        enctypes::DES3_CBC_SHA1 => 24,
        enctypes::AES128_CTS_HMAC_SHA1_96 => 16,
        enctypes::AES256_CTS_HMAC_SHA1_96 => 32,
        enctypes::ARCFOUR_HMAC => 16,
        other => panic!("no key length known for enctype {other}"),
    }
}

/// Generate one fresh random key for `enctype`.
#[must_use]
pub fn random_key(enctype: u32) -> Vec<u8> {
    let mut key = vec![0u8; key_len(enctype)];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Generate the full key set for a new rotation under `profile`: one
/// random key per enctype in [`EnctypeProfile::generated_enctypes`].
///
/// DES-CBC-MD4/MD5 are not included here even under the compat
/// profile — `COMMITKEY` replicates them from the committed
/// DES-CBC-CRC key at push time, per spec.
#[must_use]
pub fn generate_key_set(profile: EnctypeProfile) -> Vec<(i64, Vec<u8>)> {
    profile
        .generated_enctypes()
        .iter()
        .map(|&enctype| (i64::from(enctype), random_key(enctype)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_lengths_match_enctype_spec() {
        assert_eq!(key_len(enctypes::DES_CBC_CRC), 8);
        assert_eq!(key_len(enctypes::DES3_CBC_SHA1), 24);
        assert_eq!(key_len(enctypes::AES128_CTS_HMAC_SHA1_96), 16);
        assert_eq!(key_len(enctypes::AES256_CTS_HMAC_SHA1_96), 32);
        assert_eq!(key_len(enctypes::ARCFOUR_HMAC), 16);
    }

    #[test]
    fn generate_key_set_modern_profile_has_five_entries_and_no_duplicates() {
        let keys = generate_key_set(EnctypeProfile::Modern);
        assert_eq!(keys.len(), 5);
        for (enctype, key) in &keys {
            assert_eq!(key.len(), key_len(*enctype as u32));
        }
        let mut ids: Vec<i64> = keys.iter().map(|(e, _)| *e).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert!(keys.iter().any(|(e, _)| *e == i64::from(enctypes::DES_CBC_CRC)));
        assert!(keys.iter().any(|(e, _)| *e == i64::from(enctypes::DES3_CBC_SHA1)));
    }

    #[test]
    fn generate_key_set_compat_profile_is_des_only() {
        let keys = generate_key_set(EnctypeProfile::Compat);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].0, i64::from(enctypes::DES_CBC_CRC));
        assert_eq!(keys[0].1.len(), key_len(enctypes::DES_CBC_CRC));
    }

    #[test]
    fn random_keys_are_not_all_zero() {
        let key = random_key(enctypes::AES256_CTS_HMAC_SHA1_96);
        assert!(key.iter().any(|&b| b != 0));
    }
}
