//! # Canonical Bytes — Input Normalization
//!
//! This module defines `CanonicalBytes`, the sole path by which caller
//! values become leaf or data bytes inside the accumulators.
//!
//! ## Normalization rules
//!
//! 1. **Raw bytes** (`&[u8]`, `Vec<u8>`, `[u8; N]`, `Hash`) pass through.
//! 2. **Hex strings** (matching `^(0x)?[0-9A-Fa-f]*$`) are decoded.
//!    An odd number of digits is left-padded with a zero nibble.
//! 3. **Other strings** become their UTF-8 bytes.
//! 4. **`u64` numbers** are packed BCD of their decimal digits, so `12`
//!    becomes `[0x12]` and `123` becomes `[0x01, 0x23]`. MMR indices and
//!    sizes enter the default leaf, branch and bagging hashes this way.
//! 5. **`u128` big integers** are minimal big-endian bytes, at least one byte.
//!
//! Note that rule 2 wins over rule 3: `"abc"` is a hex string and decodes
//! to `[0x0a, 0xbc]`. Callers wanting UTF-8 for such strings pass bytes.

use crate::error::AccumError;
use crate::hash::Hash;

/// Bytes produced by the normalization rules above.
///
/// The inner buffer is private; construct through [`ToCanonicalBytes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Normalize any supported value.
    pub fn new(value: &(impl ToCanonicalBytes + ?Sized)) -> Self {
        value.to_canonical_bytes()
    }

    /// Access the normalized bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the underlying buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length of the byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<CanonicalBytes> for Hash {
    fn from(bytes: CanonicalBytes) -> Self {
        Hash::from_bytes(bytes.0)
    }
}

/// Values that can be normalized into [`CanonicalBytes`].
pub trait ToCanonicalBytes {
    /// Apply the normalization rules.
    fn to_canonical_bytes(&self) -> CanonicalBytes;
}

impl ToCanonicalBytes for [u8] {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        CanonicalBytes(self.to_vec())
    }
}

impl ToCanonicalBytes for Vec<u8> {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        CanonicalBytes(self.clone())
    }
}

impl<const N: usize> ToCanonicalBytes for [u8; N] {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        CanonicalBytes(self.to_vec())
    }
}

impl ToCanonicalBytes for Hash {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        CanonicalBytes(self.as_bytes().to_vec())
    }
}

impl ToCanonicalBytes for CanonicalBytes {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        self.clone()
    }
}

impl ToCanonicalBytes for str {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        if is_hex_string(self) {
            // is_hex_string guarantees decode_hex succeeds.
            if let Ok(bytes) = decode_hex(self) {
                return CanonicalBytes(bytes);
            }
        }
        CanonicalBytes(self.as_bytes().to_vec())
    }
}

impl ToCanonicalBytes for String {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        self.as_str().to_canonical_bytes()
    }
}

impl ToCanonicalBytes for u64 {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        CanonicalBytes(bcd_bytes(*self))
    }
}

impl ToCanonicalBytes for u128 {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        let bytes = self.to_be_bytes();
        let first = bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(bytes.len() - 1);
        CanonicalBytes(bytes[first..].to_vec())
    }
}

impl<T: ToCanonicalBytes + ?Sized> ToCanonicalBytes for &T {
    fn to_canonical_bytes(&self) -> CanonicalBytes {
        (**self).to_canonical_bytes()
    }
}

/// Returns true if `s` is an (optionally `0x`-prefixed) hex string.
///
/// The empty string and a bare `0x` both count as hex.
pub fn is_hex_string(s: &str) -> bool {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Decode an optionally `0x`-prefixed hex string.
///
/// Odd-length input is left-padded with a zero nibble.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, AccumError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };
    decoded.map_err(|e| AccumError::encoding(format!("invalid hex {s:?}: {e}")))
}

/// Render bytes as `0x`-prefixed lowercase hex.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Packed BCD encoding of the decimal digits of `n`.
pub fn bcd_bytes(n: u64) -> Vec<u8> {
    let mut digits: Vec<u8> = n.to_string().bytes().map(|b| b - b'0').collect();
    if digits.len() % 2 == 1 {
        digits.insert(0, 0);
    }
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_pass_through() {
        let raw = vec![0u8, 1, 2, 255];
        assert_eq!(CanonicalBytes::new(&raw).as_bytes(), &raw[..]);
        assert_eq!(CanonicalBytes::new(&[7u8, 8]).as_bytes(), &[7, 8]);
    }

    #[test]
    fn test_hex_string_decoded() {
        assert_eq!(CanonicalBytes::new("0x0102").as_bytes(), &[1, 2]);
        assert_eq!(CanonicalBytes::new("0102").as_bytes(), &[1, 2]);
        assert_eq!(CanonicalBytes::new("0xABcd").as_bytes(), &[0xab, 0xcd]);
    }

    #[test]
    fn test_odd_hex_left_padded() {
        assert_eq!(CanonicalBytes::new("0x123").as_bytes(), &[0x01, 0x23]);
        assert_eq!(CanonicalBytes::new("abc").as_bytes(), &[0x0a, 0xbc]);
    }

    #[test]
    fn test_plain_string_is_utf8() {
        assert_eq!(CanonicalBytes::new("hello").as_bytes(), b"hello");
        assert_eq!(
            CanonicalBytes::new(&String::from("0xnope")).as_bytes(),
            b"0xnope"
        );
    }

    #[test]
    fn test_empty_string() {
        assert!(CanonicalBytes::new("").is_empty());
        assert!(CanonicalBytes::new("0x").is_empty());
    }

    #[test]
    fn test_numbers_are_bcd() {
        assert_eq!(CanonicalBytes::new(&1u64).as_bytes(), &[0x01]);
        assert_eq!(CanonicalBytes::new(&12u64).as_bytes(), &[0x12]);
        assert_eq!(CanonicalBytes::new(&123u64).as_bytes(), &[0x01, 0x23]);
        assert_eq!(CanonicalBytes::new(&0u64).as_bytes(), &[0x00]);
    }

    #[test]
    fn test_big_integers_are_minimal_big_endian() {
        assert_eq!(CanonicalBytes::new(&0u128).as_bytes(), &[0x00]);
        assert_eq!(CanonicalBytes::new(&0x1234u128).as_bytes(), &[0x12, 0x34]);
        assert_eq!(CanonicalBytes::new(&0xff_0000u128).as_bytes(), &[0xff, 0, 0]);
    }

    #[test]
    fn test_is_hex_string() {
        assert!(is_hex_string("0x00ff"));
        assert!(is_hex_string("deadBEEF"));
        assert!(is_hex_string(""));
        assert!(!is_hex_string("0xg1"));
        assert!(!is_hex_string("hello"));
    }

    #[test]
    fn test_decode_hex_errors() {
        assert!(decode_hex("0xgg").is_err());
        assert!(matches!(decode_hex("zz"), Err(AccumError::Encoding(_))));
    }
}
