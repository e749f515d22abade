//! A cursor-based byte buffer for the request/response payload.
//!
//! Every handler receives its arguments and produces its results through
//! a [`Buffer`]: a flat byte vector written to by appending fields and
//! read from by consuming fields off the front, in declaration order.
//! Every read that would walk past the end of the buffer returns
//! [`WireError::Truncated`](crate::error::WireError::Truncated) rather
//! than panicking — a malformed or truncated message is just another
//! bad request, never a crash.

use crate::error::{Result, WireError};

/// Maximum length accepted for any single length-prefixed field.
///
/// Bounds allocation for attacker-controlled length prefixes, read
/// before authentication completes.
pub const MAX_FIELD_LEN: u32 = 1 << 20;

/// A growable, cursor-addressed byte buffer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    cursor: usize,
}

impl Buffer {
    /// An empty buffer, ready for writing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing byte vector for reading.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    /// Consume this buffer, returning its bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Bytes not yet consumed from the read cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(WireError::Truncated {
                wanted: n,
                available: self.remaining(),
            });
        }
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.data[start..self.cursor])
    }

    /// Write a big-endian `u32`.
    pub fn put_u32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    /// Read a big-endian `u32`.
    pub fn get_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("len checked")))
    }

    /// Write a length-prefixed byte string (`u32` length, then bytes).
    pub fn put_bytes(&mut self, v: &[u8]) {
        self.put_u32(v.len() as u32);
        self.data.extend_from_slice(v);
    }

    /// Read a length-prefixed byte string.
    pub fn get_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.get_u32()?;
        if len > MAX_FIELD_LEN {
            return Err(WireError::LengthTooLarge {
                len,
                max: MAX_FIELD_LEN,
            });
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn put_str(&mut self, v: &str) {
        self.put_bytes(v.as_bytes());
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn get_str(&mut self) -> Result<String> {
        let bytes = self.get_bytes()?;
        String::from_utf8(bytes).map_err(|_| WireError::NotUtf8)
    }

    /// Append the entirety of `other`'s remaining bytes as a raw blob,
    /// without a length prefix. Used when a field's length is implicit
    /// from the enclosing message (e.g. a MIC token filling the rest of
    /// the buffer).
    pub fn put_raw(&mut self, v: &[u8]) {
        self.data.extend_from_slice(v);
    }

    /// Consume every remaining byte as a raw blob.
    pub fn get_rest(&mut self) -> Vec<u8> {
        let rest = self.data[self.cursor..].to_vec();
        self.cursor = self.data.len();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_round_trip() {
        let mut buf = Buffer::new();
        buf.put_u32(0xdead_beef);
        let mut reader = Buffer::from_vec(buf.into_vec());
        assert_eq!(reader.get_u32().unwrap(), 0xdead_beef);
        assert!(reader.is_empty());
    }

    #[test]
    fn bytes_round_trip() {
        let mut buf = Buffer::new();
        buf.put_bytes(b"hello world");
        buf.put_u32(42);
        let mut reader = Buffer::from_vec(buf.into_vec());
        assert_eq!(reader.get_bytes().unwrap(), b"hello world");
        assert_eq!(reader.get_u32().unwrap(), 42);
    }

    #[test]
    fn str_round_trip() {
        let mut buf = Buffer::new();
        buf.put_str("host/db1.example.org@EXAMPLE.ORG");
        let mut reader = Buffer::from_vec(buf.into_vec());
        assert_eq!(
            reader.get_str().unwrap(),
            "host/db1.example.org@EXAMPLE.ORG"
        );
    }

    #[test]
    fn truncated_read_is_bad_req_not_panic() {
        let mut reader = Buffer::from_vec(vec![0, 0, 0]);
        let err = reader.get_u32().unwrap_err();
        assert_eq!(
            err,
            WireError::Truncated {
                wanted: 4,
                available: 3
            }
        );
    }

    #[test]
    fn truncated_length_prefixed_read() {
        let mut buf = Buffer::new();
        buf.put_u32(10);
        buf.put_raw(b"short");
        let mut reader = Buffer::from_vec(buf.into_vec());
        assert!(matches!(
            reader.get_bytes(),
            Err(WireError::Truncated { wanted: 10, available: 5 })
        ));
    }

    #[test]
    fn oversized_length_prefix_rejected_before_allocating() {
        let mut buf = Buffer::new();
        buf.put_u32(MAX_FIELD_LEN + 1);
        let mut reader = Buffer::from_vec(buf.into_vec());
        assert!(matches!(
            reader.get_bytes(),
            Err(WireError::LengthTooLarge { .. })
        ));
    }

    #[test]
    fn invalid_utf8_reported() {
        let mut buf = Buffer::new();
        buf.put_bytes(&[0xff, 0xfe]);
        let mut reader = Buffer::from_vec(buf.into_vec());
        assert_eq!(reader.get_str().unwrap_err(), WireError::NotUtf8);
    }

    proptest::proptest! {
        #[test]
        fn u32_round_trips_for_any_value(v: u32) {
            let mut buf = Buffer::new();
            buf.put_u32(v);
            let mut reader = Buffer::from_vec(buf.into_vec());
            proptest::prop_assert_eq!(reader.get_u32().unwrap(), v);
            proptest::prop_assert!(reader.is_empty());
        }

        #[test]
        fn bytes_round_trip_for_any_payload(v in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256)) {
            let mut buf = Buffer::new();
            buf.put_bytes(&v);
            let mut reader = Buffer::from_vec(buf.into_vec());
            proptest::prop_assert_eq!(reader.get_bytes().unwrap(), v);
            proptest::prop_assert!(reader.is_empty());
        }

        #[test]
        fn get_never_panics_on_arbitrary_bytes(v in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let mut reader = Buffer::from_vec(v);
            let _ = reader.get_u32();
            let _ = reader.get_bytes();
            let _ = reader.get_str();
        }
    }
}
