//! # Mountain Hashing
//!
//! The three hash roles of an MMR, all keyed by position:
//!
//! - Leaf: `H(bcd(index) || H(data))`.
//! - Branch: `H(bcd(index) || left || right)`.
//! - Bagging: `H(bcd(size) || peak_1 || ... || peak_k)`, peaks left to right.
//!
//! `bcd` is the packed-decimal number encoding of
//! [`accum_core::canonical::bcd_bytes`]. Any [`Hasher`] from `accum-core`
//! gets these defaults; [`MountainFns`] replaces any of them with a closure.

use std::fmt;
use std::sync::Arc;

use accum_core::canonical::bcd_bytes;
use accum_core::hash::concat;
use accum_core::{DigestHasher, FnHasher, Hash, Hasher, IdentityHasher};

/// Hash functions used by a [`Mmr`](crate::Mmr).
pub trait MountainHasher: Hasher {
    /// Hash of the leaf at `index` whose data hashes to `data_hash`.
    fn hash_leaf(&self, index: u64, data_hash: &Hash) -> Hash {
        default_hash_leaf(self, index, data_hash)
    }

    /// Hash of the parent at `index`.
    fn hash_branch(&self, index: u64, left: &Hash, right: &Hash) -> Hash {
        default_hash_branch(self, index, left, right)
    }

    /// Root of an MMR of `size` nodes with the given peaks.
    fn bag_peaks(&self, size: u64, peaks: &[Hash]) -> Hash {
        default_bag_peaks(self, size, peaks)
    }
}

pub fn default_hash_leaf<H: Hasher + ?Sized>(hasher: &H, index: u64, data_hash: &Hash) -> Hash {
    hasher.hash(&concat([bcd_bytes(index).as_slice(), data_hash.as_bytes()]))
}

pub fn default_hash_branch<H: Hasher + ?Sized>(hasher: &H, index: u64, left: &Hash, right: &Hash) -> Hash {
    hasher.hash(&concat([
        bcd_bytes(index).as_slice(),
        left.as_bytes(),
        right.as_bytes(),
    ]))
}

pub fn default_bag_peaks<H: Hasher + ?Sized>(hasher: &H, size: u64, peaks: &[Hash]) -> Hash {
    let size = bcd_bytes(size);
    hasher.hash(&concat(
        std::iter::once(size.as_slice()).chain(peaks.iter().map(Hash::as_bytes)),
    ))
}

impl<D: sha2::Digest> MountainHasher for DigestHasher<D> {}

impl MountainHasher for IdentityHasher {}

impl<F> MountainHasher for FnHasher<F> where FnHasher<F>: Hasher {}

type LeafFn = Arc<dyn Fn(u64, &Hash) -> Hash + Send + Sync>;
type BranchFn = Arc<dyn Fn(u64, &Hash, &Hash) -> Hash + Send + Sync>;
type BagFn = Arc<dyn Fn(u64, &[Hash]) -> Hash + Send + Sync>;

/// A base hasher with any of the three roles overridden.
#[derive(Clone)]
pub struct MountainFns<H> {
    hasher: H,
    leaf: Option<LeafFn>,
    branch: Option<BranchFn>,
    bag: Option<BagFn>,
}

impl<H: Hasher> MountainFns<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            leaf: None,
            branch: None,
            bag: None,
        }
    }

    /// Override the leaf hash.
    pub fn with_leaf(mut self, f: impl Fn(u64, &Hash) -> Hash + Send + Sync + 'static) -> Self {
        self.leaf = Some(Arc::new(f));
        self
    }

    /// Override the branch hash.
    pub fn with_branch(
        mut self,
        f: impl Fn(u64, &Hash, &Hash) -> Hash + Send + Sync + 'static,
    ) -> Self {
        self.branch = Some(Arc::new(f));
        self
    }

    /// Override peak bagging.
    pub fn with_bagging(mut self, f: impl Fn(u64, &[Hash]) -> Hash + Send + Sync + 'static) -> Self {
        self.bag = Some(Arc::new(f));
        self
    }
}

impl<H> fmt::Debug for MountainFns<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountainFns")
            .field("leaf", &self.leaf.is_some())
            .field("branch", &self.branch.is_some())
            .field("bag", &self.bag.is_some())
            .finish()
    }
}

impl<H: Hasher> Hasher for MountainFns<H> {
    fn hash(&self, data: &[u8]) -> Hash {
        self.hasher.hash(data)
    }
}

impl<H: Hasher> MountainHasher for MountainFns<H> {
    fn hash_leaf(&self, index: u64, data_hash: &Hash) -> Hash {
        match &self.leaf {
            Some(f) => f(index, data_hash),
            None => default_hash_leaf(&self.hasher, index, data_hash),
        }
    }

    fn hash_branch(&self, index: u64, left: &Hash, right: &Hash) -> Hash {
        match &self.branch {
            Some(f) => f(index, left, right),
            None => default_hash_branch(&self.hasher, index, left, right),
        }
    }

    fn bag_peaks(&self, size: u64, peaks: &[Hash]) -> Hash {
        match &self.bag {
            Some(f) => f(size, peaks),
            None => default_bag_peaks(&self.hasher, size, peaks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roles_with_identity() {
        let h = IdentityHasher;
        let leaf = h.hash_leaf(12, &Hash::from_bytes(vec![0xaa]));
        assert_eq!(leaf.as_bytes(), &[0x12, 0xaa]);
        let branch = h.hash_branch(3, &Hash::from_bytes(vec![1]), &Hash::from_bytes(vec![2]));
        assert_eq!(branch.as_bytes(), &[0x03, 0x01, 0x02]);
        let root = h.bag_peaks(
            123,
            &[Hash::from_bytes(vec![7]), Hash::from_bytes(vec![8])],
        );
        assert_eq!(root.as_bytes(), &[0x01, 0x23, 0x07, 0x08]);
    }

    #[test]
    fn test_overrides_apply_only_where_set() {
        let fns = MountainFns::new(IdentityHasher).with_leaf(|_, data| data.clone());
        assert_eq!(fns.hash_leaf(5, &Hash::from_bytes(vec![9])).as_bytes(), &[9]);
        assert_eq!(
            fns.hash_branch(6, &Hash::from_bytes(vec![1]), &Hash::from_bytes(vec![2]))
                .as_bytes(),
            &[0x06, 0x01, 0x02]
        );
    }

    #[test]
    fn test_sha256_leaf_hash() {
        let h = accum_core::Sha256Hasher::new();
        let data_hash = h.hash(b"hello");
        let expected = h.hash(&concat([&[0x01u8][..], data_hash.as_bytes()]));
        assert_eq!(h.hash_leaf(1, &data_hash), expected);
    }
}
