//! # Hash Adapter
//!
//! The accumulators are hash-function agnostic. They see only the
//! [`Hasher`] trait: a deterministic function from bytes to a [`Hash`].
//!
//! Caller-supplied functions rarely return exactly that, so [`FnHasher`]
//! wraps any `Fn(&[u8]) -> O` whose output implements [`HashOutput`]:
//! raw byte containers, hex strings, big integers, or a `sha2` digest array.
//! [`DigestHasher`] plugs any RustCrypto `Digest` straight in; SHA-256 is
//! the default for every structure in the workspace.

use std::marker::PhantomData;

use sha2::digest::generic_array::{ArrayLength, GenericArray};
use sha2::Digest;

use crate::canonical::ToCanonicalBytes;
use crate::hash::Hash;

/// A deterministic one-way function over bytes.
pub trait Hasher {
    /// Hash `data`.
    fn hash(&self, data: &[u8]) -> Hash;
}

impl<H: Hasher + ?Sized> Hasher for &H {
    fn hash(&self, data: &[u8]) -> Hash {
        (**self).hash(data)
    }
}

impl<H: Hasher + ?Sized> Hasher for Box<H> {
    fn hash(&self, data: &[u8]) -> Hash {
        (**self).hash(data)
    }
}

impl<H: Hasher + ?Sized> Hasher for std::sync::Arc<H> {
    fn hash(&self, data: &[u8]) -> Hash {
        (**self).hash(data)
    }
}

/// Output of a caller-supplied hash function, normalized to a [`Hash`].
pub trait HashOutput {
    /// Convert into hash bytes.
    fn into_hash(self) -> Hash;
}

impl HashOutput for Hash {
    fn into_hash(self) -> Hash {
        self
    }
}

impl HashOutput for Vec<u8> {
    fn into_hash(self) -> Hash {
        Hash::from_bytes(self)
    }
}

impl HashOutput for &[u8] {
    fn into_hash(self) -> Hash {
        Hash::from_bytes(self)
    }
}

impl<const N: usize> HashOutput for [u8; N] {
    fn into_hash(self) -> Hash {
        Hash::from(self)
    }
}

impl HashOutput for String {
    fn into_hash(self) -> Hash {
        self.to_canonical_bytes().into()
    }
}

impl HashOutput for &str {
    fn into_hash(self) -> Hash {
        self.to_canonical_bytes().into()
    }
}

impl HashOutput for u128 {
    fn into_hash(self) -> Hash {
        self.to_canonical_bytes().into()
    }
}

impl<N: ArrayLength<u8>> HashOutput for GenericArray<u8, N> {
    fn into_hash(self) -> Hash {
        Hash::from_bytes(self.to_vec())
    }
}

/// Adapts a closure into a [`Hasher`].
#[derive(Clone, Copy)]
pub struct FnHasher<F>(F);

impl<F> FnHasher<F> {
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, O> Hasher for FnHasher<F>
where
    F: Fn(&[u8]) -> O,
    O: HashOutput,
{
    fn hash(&self, data: &[u8]) -> Hash {
        (self.0)(data).into_hash()
    }
}

impl<F> std::fmt::Debug for FnHasher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnHasher")
    }
}

/// A [`Hasher`] backed by a RustCrypto [`Digest`].
pub struct DigestHasher<D>(PhantomData<fn() -> D>);

impl<D> DigestHasher<D> {
    /// Create the hasher.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<D> Default for DigestHasher<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for DigestHasher<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for DigestHasher<D> {}

impl<D> std::fmt::Debug for DigestHasher<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DigestHasher<{}>", std::any::type_name::<D>())
    }
}

impl<D: Digest> Hasher for DigestHasher<D> {
    fn hash(&self, data: &[u8]) -> Hash {
        D::digest(data).into_hash()
    }
}

/// SHA-256, the default hash function.
pub type Sha256Hasher = DigestHasher<sha2::Sha256>;

/// SHA-512.
pub type Sha512Hasher = DigestHasher<sha2::Sha512>;

/// The identity function. Every "hash" is its input, so a pair hashes to
/// the concatenation of its halves. Useful for literal expectations in tests
/// and for inspecting tree shapes; it offers no security.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHasher;

impl Hasher for IdentityHasher {
    fn hash(&self, data: &[u8]) -> Hash {
        Hash::from(data)
    }
}
