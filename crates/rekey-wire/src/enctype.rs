//! Kerberos encryption type constants and the server's enctype policy.

/// Kerberos encryption type numbers, as assigned by RFC 3961 and the
/// MIT krb5 registry. These are wire constants, not an exhaustive
/// reimplementation of every registered enctype.
pub mod enctype {
    /// des-cbc-crc.
    pub const DES_CBC_CRC: u32 = 1;
    /// des-cbc-md4.
    pub const DES_CBC_MD4: u32 = 2;
    /// des-cbc-md5.
    pub const DES_CBC_MD5: u32 = 3;
    /// des3-cbc-sha1.
    pub const DES3_CBC_SHA1: u32 = 16;
    /// aes128-cts-hmac-sha1-96.
    pub const AES128_CTS_HMAC_SHA1_96: u32 = 17;
    /// aes256-cts-hmac-sha1-96.
    pub const AES256_CTS_HMAC_SHA1_96: u32 = 18;
    /// rc4-hmac.
    pub const ARCFOUR_HMAC: u32 = 23;
}

/// Which set of encryption types the server generates keys for.
///
/// Selected by the `-c` CLI flag (see `rekey-server::config`): the
/// default profile generates DES-CBC-CRC and DES3-CBC-SHA1 — the
/// mandatory floor every rekeyed principal gets — plus AES128, AES256,
/// and RC4-HMAC where the realm can use them; the `-c` (compat)
/// profile forces legacy DES-only compatibility, narrowing the set to
/// single-DES for realms that cannot use anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnctypeProfile {
    /// DES-CBC-CRC, DES3-CBC-SHA1, AES128, AES256, and RC4-HMAC.
    #[default]
    Modern,
    /// DES-CBC-CRC only.
    ///
    /// `COMMITKEY` replicates this key under the MD4 and MD5 checksum
    /// variants as well, since all three single-DES enctypes share key
    /// material and differ only in checksum.
    Compat,
}

impl EnctypeProfile {
    /// The enctypes this profile generates fresh key material for.
    ///
    /// DES-CBC-MD4 and DES-CBC-MD5 are deliberately absent: they are
    /// populated in `COMMITKEY` from the DES-CBC-CRC key, not generated
    /// independently.
    #[must_use]
    pub fn generated_enctypes(self) -> &'static [u32] {
        match self {
            Self::Modern => &[
                enctype::DES_CBC_CRC,
                enctype::DES3_CBC_SHA1,
                enctype::AES128_CTS_HMAC_SHA1_96,
                enctype::AES256_CTS_HMAC_SHA1_96,
                enctype::ARCFOUR_HMAC,
            ],
            Self::Compat => &[enctype::DES_CBC_CRC],
        }
    }
}
