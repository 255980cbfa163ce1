//! # Hash — Opaque Node Values
//!
//! Defines `Hash`, the value stored at every tree node, MMR node, and proof
//! entry. A hash is an arbitrary-length byte sequence: the core never assumes
//! a digest length, so the same type carries SHA-256 output, raw leaves of a
//! tree built without `hashLeaves`, and the empty root of an empty structure.
//!
//! Only byte-wise equality and lexicographic ordering are meaningful. The
//! derived `Ord` compares bytes lexicographically, which is exactly the order
//! used when pairs or leaves are sorted.
//!
//! ## Textual form
//!
//! Hashes render as `0x`-prefixed lowercase hex and serialize to that same
//! string, so trees and proofs round-trip through JSON.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canonical::decode_hex;
use crate::error::AccumError;

/// An opaque hash value.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(Vec<u8>);

impl Hash {
    /// The empty hash (root of an empty structure).
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AccumError> {
        decode_hex(s).map(Self)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the hash, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty hash.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy with the byte order reversed (little-endian block-hash convention).
    pub fn reversed(&self) -> Self {
        let mut bytes = self.0.clone();
        bytes.reverse();
        Self(bytes)
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Render as lowercase hex without a prefix.
    pub fn to_plain_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Hash {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Hash {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Hash {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl std::str::FromStr for Hash {
    type Err = AccumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Concatenate byte slices into one buffer.
pub fn concat<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}
