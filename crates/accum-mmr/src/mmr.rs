//! # Merkle Mountain Range (MMR)
//!
//! An append-only accumulator. Leaves are stored at 1-based positions in a
//! pre-order numbering across a forest of perfect binary subtrees
//! ("mountains"); the root bags the current peaks.
//!
//! ## Node storage
//!
//! Each instance owns a position-to-hash map. A leaf hash is recorded on
//! append; interior nodes are materialized on demand from their children
//! and memoized, so no node is ever computed twice. Materialization uses an
//! explicit work stack rather than recursion.
//!
//! ## Proofs
//!
//! A proof carries the root, the width, every peak (for re-bagging) and the
//! siblings from the leaf up to its peak, bottom first. Verification bags
//! the peaks, walks the path from the covering peak down to the leaf, then
//! hashes back up and compares the result to that peak.

use std::collections::{BTreeMap, HashMap};

use accum_core::bits;
use accum_core::{AccumError, Hash, ProofError, Result, Sha256Hasher, ToCanonicalBytes};
use serde::{Deserialize, Serialize};

use crate::hasher::MountainHasher;
use crate::peaks::{self, PeakMap, MAX_WIDTH};

// ---------------------------------------------------------------------------
// Position arithmetic
// ---------------------------------------------------------------------------

/// Returns true if the node at `index` is a leaf.
pub fn is_leaf(index: u64) -> bool {
    index > 0 && bits::height_at(index) == 1
}

/// Left and right child positions of the parent at `index`.
pub fn children(index: u64) -> Result<(u64, u64)> {
    let height = bits::height_at(index);
    if height <= 1 {
        return Err(AccumError::NotAParent(index));
    }
    Ok((index - (1u64 << (height - 1)), index - 1))
}

// ---------------------------------------------------------------------------
// Proof
// ---------------------------------------------------------------------------

/// Inclusion proof for one MMR leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmrProof {
    pub root: Hash,
    pub width: u64,
    /// All peak hashes, leftmost mountain first.
    pub peak_bagging: Vec<Hash>,
    /// Siblings from the leaf level up to the peak.
    pub siblings: Vec<Hash>,
}

// ---------------------------------------------------------------------------
// Mmr
// ---------------------------------------------------------------------------

/// A Merkle Mountain Range over a [`MountainHasher`].
#[derive(Debug, Clone)]
pub struct Mmr<M = Sha256Hasher> {
    hasher: M,
    root: Hash,
    size: u64,
    width: u64,
    hashes: BTreeMap<u64, Hash>,
    data: HashMap<Hash, Vec<u8>>,
}

impl Mmr<Sha256Hasher> {
    /// An empty SHA-256 MMR.
    pub fn sha256() -> Self {
        Self::new(Sha256Hasher::new())
    }
}

impl<M: MountainHasher> Mmr<M> {
    pub fn new(hasher: M) -> Self {
        Self {
            hasher,
            root: Hash::empty(),
            size: 0,
            width: 0,
            hashes: BTreeMap::new(),
            data: HashMap::new(),
        }
    }

    /// An MMR with `leaves` appended in order.
    pub fn from_leaves<I>(leaves: I, hasher: M) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: ToCanonicalBytes,
    {
        let mut mmr = Self::new(hasher);
        for leaf in leaves {
            mmr.append(leaf)?;
        }
        Ok(mmr)
    }

    /// Append a leaf, returning the position it was stored at.
    pub fn append(&mut self, data: impl ToCanonicalBytes) -> Result<u64> {
        if self.width >= MAX_WIDTH {
            return Err(AccumError::IndexOutOfRange {
                index: self.width + 1,
                size: MAX_WIDTH,
            });
        }
        let data = data.to_canonical_bytes().into_vec();
        let data_hash = self.hasher.hash(&data);
        self.data.entry(data_hash.clone()).or_insert(data);

        let index = self.size + 1;
        let leaf = self.hasher.hash_leaf(index, &data_hash);
        self.hashes.insert(index, leaf);
        self.width += 1;
        self.size = bits::mmr_size(self.width);

        let peaks = bits::peak_indexes(self.width)
            .into_iter()
            .map(|peak| self.get_or_create_node(peak))
            .collect::<Result<Vec<_>>>()?;
        self.root = peaks::bag(&self.hasher, self.width, &peaks)?;
        tracing::debug!(
            index,
            width = self.width,
            size = self.size,
            peaks = peaks.len(),
            "appended MMR leaf"
        );
        Ok(index)
    }

    fn get_or_create_node(&mut self, index: u64) -> Result<Hash> {
        if index == 0 || index > self.size {
            return Err(AccumError::IndexOutOfRange {
                index,
                size: self.size,
            });
        }
        let mut stack = vec![index];
        while let Some(&top) = stack.last() {
            if self.hashes.contains_key(&top) {
                stack.pop();
                continue;
            }
            let (left, right) = children(top)?;
            let branch = match (self.hashes.get(&left), self.hashes.get(&right)) {
                (Some(l), Some(r)) => Some(self.hasher.hash_branch(top, l, r)),
                (l, r) => {
                    if l.is_none() {
                        stack.push(left);
                    }
                    if r.is_none() {
                        stack.push(right);
                    }
                    None
                }
            };
            if let Some(hash) = branch {
                tracing::trace!(index = top, "materialized MMR node");
                self.hashes.insert(top, hash);
                stack.pop();
            }
        }
        self.stored(index)
    }

    fn stored(&self, index: u64) -> Result<Hash> {
        self.hashes
            .get(&index)
            .cloned()
            .ok_or(AccumError::IndexOutOfRange {
                index,
                size: self.size,
            })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn hasher(&self) -> &M {
        &self.hasher
    }

    /// The bagged root; empty when no leaf has been appended.
    pub fn root(&self) -> &Hash {
        &self.root
    }

    pub fn hex_root(&self) -> String {
        self.root.to_hex()
    }

    /// Number of nodes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of leaves.
    pub fn width(&self) -> u64 {
        self.width
    }

    /// Current peak hashes, leftmost mountain first.
    pub fn peaks(&self) -> Vec<Hash> {
        bits::peak_indexes(self.width)
            .iter()
            .filter_map(|index| self.hashes.get(index).cloned())
            .collect()
    }

    /// Current peaks keyed by height.
    pub fn peak_map(&self) -> Result<PeakMap> {
        peaks::peaks_to_peak_map(self.width, &self.peaks())
    }

    /// The hash stored at `index`, if materialized.
    pub fn node(&self, index: u64) -> Option<&Hash> {
        self.hashes.get(&index)
    }

    /// Original data of an appended leaf, looked up by its data hash.
    pub fn data(&self, data_hash: &Hash) -> Option<&[u8]> {
        self.data.get(data_hash).map(Vec::as_slice)
    }

    // -----------------------------------------------------------------------
    // Proofs
    // -----------------------------------------------------------------------

    /// Inclusion proof for the leaf at position `index`.
    pub fn merkle_proof(&self, index: u64) -> Result<MmrProof> {
        if index == 0 || index > self.size {
            return Err(AccumError::IndexOutOfRange {
                index,
                size: self.size,
            });
        }
        if !is_leaf(index) {
            return Err(AccumError::NotALeaf(index));
        }
        let peak_indexes = bits::peak_indexes(self.width);
        let peak_bagging = peak_indexes
            .iter()
            .map(|peak| self.stored(*peak))
            .collect::<Result<Vec<_>>>()?;
        let mut cursor = peak_indexes
            .iter()
            .copied()
            .find(|peak| *peak >= index)
            .ok_or(ProofError::TargetNotFound(index))?;

        let mut siblings = Vec::new();
        while cursor != index {
            let (left, right) = children(cursor)?;
            let (next, sibling) = if index <= left {
                (left, right)
            } else {
                (right, left)
            };
            siblings.push(self.stored(sibling)?);
            cursor = next;
        }
        siblings.reverse();

        Ok(MmrProof {
            root: self.root.clone(),
            width: self.width,
            peak_bagging,
            siblings,
        })
    }

    /// Check that `value` is the leaf at `index` of the MMR with the given
    /// root, width and peaks.
    ///
    /// Returns `Ok(false)` when the root does not bag from the peaks or the
    /// climbed path does not reach the covering peak.
    pub fn verify(
        &self,
        root: &Hash,
        width: u64,
        index: u64,
        value: impl ToCanonicalBytes,
        peaks: &[Hash],
        siblings: &[Hash],
    ) -> Result<bool> {
        if width > MAX_WIDTH {
            return Err(AccumError::IndexOutOfRange {
                index: width,
                size: MAX_WIDTH,
            });
        }
        let size = bits::mmr_size(width);
        if index == 0 || index > size {
            return Err(AccumError::IndexOutOfRange { index, size });
        }
        if !is_leaf(index) {
            return Err(AccumError::NotALeaf(index));
        }
        if &peaks::bag(&self.hasher, width, peaks)? != root {
            return Ok(false);
        }

        let (mut cursor, target_peak) = bits::peak_indexes(width)
            .into_iter()
            .zip(peaks)
            .find(|(peak, _)| *peak >= index)
            .ok_or(ProofError::TargetNotFound(index))?;

        // Path from the peak down to the leaf.
        let mut path = vec![cursor];
        while cursor != index {
            let (left, right) = children(cursor)?;
            cursor = if index > left { right } else { left };
            path.push(cursor);
        }
        if siblings.len() != path.len() - 1 {
            return Err(ProofError::SiblingCount {
                expected: path.len() - 1,
                actual: siblings.len(),
            }
            .into());
        }
        path.reverse();

        let data = value.to_canonical_bytes();
        let mut node = self.hasher.hash_leaf(index, &self.hasher.hash(data.as_bytes()));
        for (pair, sibling) in path.windows(2).zip(siblings) {
            let (child, parent) = (pair[0], pair[1]);
            node = if parent - 1 == child {
                self.hasher.hash_branch(parent, sibling, &node)
            } else {
                self.hasher.hash_branch(parent, &node, sibling)
            };
        }
        Ok(&node == target_peak)
    }

    /// [`verify`](Self::verify) with the fields of a serialized proof.
    pub fn verify_proof(
        &self,
        proof: &MmrProof,
        index: u64,
        value: impl ToCanonicalBytes,
    ) -> Result<bool> {
        self.verify(
            &proof.root,
            proof.width,
            index,
            value,
            &proof.peak_bagging,
            &proof.siblings,
        )
    }

    // -----------------------------------------------------------------------
    // Peak summaries
    // -----------------------------------------------------------------------

    /// Root of an MMR of `width` leaves with the given peaks.
    pub fn peak_bagging(&self, width: u64, peaks: &[Hash]) -> Result<Hash> {
        peaks::bag(&self.hasher, width, peaks)
    }

    /// See [`peaks::peak_update`].
    pub fn peak_update(&self, width: u64, prev: &PeakMap, item_hash: &Hash) -> Result<PeakMap> {
        peaks::peak_update(&self.hasher, width, prev, item_hash)
    }

    /// See [`peaks::roll_up`]. Items are data hashes, as produced by
    /// [`Hasher::hash`](accum_core::Hasher::hash) over the leaf data.
    pub fn roll_up(
        &self,
        root: &Hash,
        width: u64,
        peaks: &[Hash],
        item_hashes: &[Hash],
    ) -> Result<Option<Hash>> {
        peaks::roll_up(&self.hasher, root, width, peaks, item_hashes)
    }
}
