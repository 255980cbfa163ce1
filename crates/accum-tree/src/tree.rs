//! # Binary Merkle Tree — Construction and Single-Leaf Proofs
//!
//! Layer 0 holds the processed leaves; each following layer halves the one
//! below until a single root remains. A lone trailing node of an odd-length
//! layer is promoted unchanged, or paired with itself when the tree uses
//! `duplicateOdd` or the bitcoin convention.
//!
//! In `complete` mode with a non-power-of-two leaf count `n`, only the first
//! `2n - 2^ceil(log2 n)` leaves are paired at layer 0; the rest are carried
//! up unmodified so that layer 1 already has a power-of-two length.
//!
//! Layers are rebuilt in full on every leaf-set mutation.
//!
//! ## Security Invariant
//!
//! Leaves enter only through [`ToCanonicalBytes`], and every combination
//! goes through [`MerkleTree::combine`], so construction and verification
//! cannot disagree on pair order, sorting, or byte reversal.

use accum_core::bits;
use accum_core::hash::concat;
use accum_core::{Hash, Hasher, Result, Sha256Hasher, ToCanonicalBytes};

use crate::options::TreeOptions;
use crate::proof::{ProofEntry, Side};

/// A binary Merkle tree over an ordered leaf sequence.
#[derive(Debug, Clone)]
pub struct MerkleTree<H = Sha256Hasher> {
    pub(crate) hasher: H,
    pub(crate) options: TreeOptions,
    pub(crate) leaves: Vec<Hash>,
    pub(crate) layers: Vec<Vec<Hash>>,
    /// Number of trailing leaves added by the default-hash filler.
    pub(crate) padding: usize,
}

impl MerkleTree<Sha256Hasher> {
    /// Build a SHA-256 tree.
    pub fn sha256<I>(leaves: I, options: TreeOptions) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: ToCanonicalBytes,
    {
        Self::new(leaves, Sha256Hasher::new(), options)
    }
}

impl<H: Hasher> MerkleTree<H> {
    /// Build a tree from `leaves`.
    ///
    /// Fails only for incompatible options.
    pub fn new<I>(leaves: I, hasher: H, options: TreeOptions) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: ToCanonicalBytes,
    {
        let options = options.validate()?;
        let mut tree = Self {
            hasher,
            options,
            leaves: Vec::new(),
            layers: Vec::new(),
            padding: 0,
        };
        let raw: Vec<Hash> = leaves
            .into_iter()
            .map(|leaf| leaf.to_canonical_bytes().into())
            .collect();
        let processed = if tree.options.hash_leaves {
            raw.iter().map(|leaf| tree.hasher.hash(leaf.as_bytes())).collect()
        } else {
            raw
        };
        tree.process_leaves(processed);
        Ok(tree)
    }

    /// Build a tree from leaves that are already hashed, sorted and padded.
    ///
    /// Every stored leaf counts as a real leaf, filler included.
    pub(crate) fn from_processed(leaves: Vec<Hash>, hasher: H, options: TreeOptions) -> Result<Self> {
        let options = options.validate()?;
        let mut tree = Self {
            hasher,
            options,
            leaves,
            layers: Vec::new(),
            padding: 0,
        };
        tree.build_layers();
        Ok(tree)
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    fn process_leaves(&mut self, mut leaves: Vec<Hash>) {
        if self.options.sort_leaves {
            leaves.sort();
        }
        self.padding = 0;
        if let Some(fill) = &self.options.fill_default_hash {
            let target = bits::next_power_of_two(leaves.len() as u64) as usize;
            for i in leaves.len()..target {
                leaves.push(fill.hash_at(i));
                self.padding += 1;
            }
        }
        self.leaves = leaves;
        self.build_layers();
    }

    fn build_layers(&mut self) {
        let mut layers = Vec::new();
        let mut current = self.leaves.clone();
        while current.len() > 1 {
            let limit = if layers.is_empty() {
                self.first_layer_limit()
            } else {
                current.len()
            };
            let mut next = Vec::with_capacity(current.len() / 2 + 1);
            for pair in current[..limit].chunks(2) {
                next.push(match pair.get(1) {
                    Some(right) => self.combine(&pair[0], right),
                    None => self.lone(&pair[0]),
                });
            }
            next.extend_from_slice(&current[limit..]);
            tracing::trace!(layer = layers.len() + 1, nodes = next.len(), "built layer");
            layers.push(current);
            current = next;
        }
        layers.push(current);
        self.layers = layers;
        tracing::debug!(
            leaves = self.leaves.len(),
            layers = self.layers.len(),
            "merkle tree rebuilt"
        );
    }

    /// Number of layer-0 nodes that are paired; the rest are carried up.
    pub(crate) fn first_layer_limit(&self) -> usize {
        let n = self.leaves.len();
        if self.options.complete && n > 1 && !bits::is_power_of_two(n as u64) {
            2 * n - bits::next_power_of_two(n as u64) as usize
        } else {
            n
        }
    }

    /// Combine a left and right node under the tree's pairing rules.
    pub fn combine(&self, left: &Hash, right: &Hash) -> Hash {
        let (mut a, mut b) = if self.options.is_bitcoin_tree {
            (left.reversed(), right.reversed())
        } else {
            (left.clone(), right.clone())
        };
        if self.options.sort_pairs && b < a {
            std::mem::swap(&mut a, &mut b);
        }
        let hash = self.hasher.hash(&concat([a.as_bytes(), b.as_bytes()]));
        if self.options.is_bitcoin_tree {
            self.hasher.hash(hash.as_bytes()).reversed()
        } else {
            hash
        }
    }

    /// The parent of a lone trailing node.
    pub(crate) fn lone(&self, node: &Hash) -> Hash {
        if self.options.pairs_odd_with_self() {
            self.combine(node, node)
        } else {
            node.clone()
        }
    }

    /// Hash `data` with the tree's hash function.
    pub fn hash(&self, data: &[u8]) -> Hash {
        self.hasher.hash(data)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append a leaf and rebuild. The leaf is hashed once if `should_hash`
    /// is set or the tree hashes its leaves.
    pub fn add_leaf(&mut self, leaf: impl ToCanonicalBytes, should_hash: bool) {
        self.add_leaves([leaf], should_hash);
    }

    /// Append several leaves and rebuild once.
    pub fn add_leaves<I>(&mut self, leaves: I, should_hash: bool)
    where
        I: IntoIterator,
        I::Item: ToCanonicalBytes,
    {
        let hash = should_hash || self.options.hash_leaves;
        let mut all = std::mem::take(&mut self.leaves);
        all.truncate(all.len() - self.padding);
        for leaf in leaves {
            let bytes = leaf.to_canonical_bytes();
            all.push(if hash {
                self.hasher.hash(bytes.as_bytes())
            } else {
                bytes.into()
            });
        }
        self.process_leaves(all);
    }

    /// Clear all leaves and layers.
    pub fn reset(&mut self) {
        self.leaves.clear();
        self.layers.clear();
        self.padding = 0;
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The validated options.
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Processed leaves (layer 0).
    pub fn leaves(&self) -> &[Hash] {
        &self.leaves
    }

    /// Leaves whose value appears in `values`. Values are hashed first when
    /// the tree hashes its leaves.
    pub fn leaves_matching<T: ToCanonicalBytes>(&self, values: &[T]) -> Vec<Hash> {
        let wanted: std::collections::HashSet<Hash> = values
            .iter()
            .map(|v| {
                let bytes = v.to_canonical_bytes();
                if self.options.hash_leaves {
                    self.hasher.hash(bytes.as_bytes())
                } else {
                    bytes.into()
                }
            })
            .collect();
        self.leaves
            .iter()
            .filter(|leaf| wanted.contains(*leaf))
            .cloned()
            .collect()
    }

    /// The leaf at `index`, or the empty hash when out of range.
    pub fn leaf(&self, index: usize) -> Hash {
        self.leaves.get(index).cloned().unwrap_or_default()
    }

    /// Position of the first leaf equal to `value`.
    pub fn leaf_index(&self, value: impl ToCanonicalBytes) -> Option<usize> {
        let target = value.to_canonical_bytes();
        self.leaves
            .iter()
            .position(|leaf| leaf.as_bytes() == target.as_bytes())
    }

    /// Number of leaves, including filler.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// All layers, leaves first and root last.
    pub fn layers(&self) -> &[Vec<Hash>] {
        &self.layers
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of layers above the leaves.
    pub fn depth(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    /// The root, or the empty hash for an empty tree.
    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .cloned()
            .unwrap_or_default()
    }

    /// All layers flattened root-first, behind a single zero byte at slot 0.
    pub fn layers_flat(&self) -> Vec<Hash> {
        let mut flat = vec![Hash::from_bytes(vec![0u8])];
        for layer in self.layers.iter().rev() {
            flat.extend(layer.iter().cloned());
        }
        flat
    }

    pub fn hex_root(&self) -> String {
        self.root().to_hex()
    }

    pub fn hex_leaves(&self) -> Vec<String> {
        self.leaves.iter().map(Hash::to_hex).collect()
    }

    pub fn hex_layers(&self) -> Vec<Vec<String>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(Hash::to_hex).collect())
            .collect()
    }

    pub fn hex_layers_flat(&self) -> Vec<String> {
        self.layers_flat().iter().map(Hash::to_hex).collect()
    }

    // -----------------------------------------------------------------------
    // Node navigation
    // -----------------------------------------------------------------------

    /// Sibling and parent of node `index` in `layer`.
    ///
    /// The sibling is `None` for the root, for leaves carried up by
    /// `complete` layering, and for a promoted lone node. A lone node that
    /// is paired with itself is its own sibling.
    pub(crate) fn step(&self, layer: usize, index: usize) -> (Option<(usize, Side)>, usize) {
        let len = self.layers[layer].len();
        if layer + 1 >= self.layers.len() {
            return (None, index / 2);
        }
        if layer == 0 {
            let limit = self.first_layer_limit();
            if index >= limit {
                return (None, limit / 2 + (index - limit));
            }
        }
        let sibling = if index % 2 == 1 {
            Some((index - 1, Side::Left))
        } else if index + 1 < len {
            Some((index + 1, Side::Right))
        } else if self.options.pairs_odd_with_self() {
            Some((index, Side::Right))
        } else {
            None
        };
        (sibling, index / 2)
    }

    /// Indices in `layer - 1` of the children of node `index` in `layer`.
    pub(crate) fn children_of(&self, layer: usize, index: usize) -> Vec<usize> {
        if layer == 0 {
            return Vec::new();
        }
        if layer == 1 {
            let limit = self.first_layer_limit();
            if 2 * index >= limit {
                return vec![index - limit / 2 + limit];
            }
        }
        let below = self.layers[layer - 1].len();
        [2 * index, 2 * index + 1]
            .into_iter()
            .filter(|child| *child < below)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Single-leaf proofs
    // -----------------------------------------------------------------------

    /// Proof for the leaf at `index`; empty when `index` is out of range.
    pub fn proof_at(&self, index: usize) -> Vec<ProofEntry> {
        let mut proof = Vec::new();
        if index >= self.leaves.len() {
            return proof;
        }
        let mut index = index;
        for layer in 0..self.layers.len() {
            let (sibling, parent) = self.step(layer, index);
            if let Some((sibling, side)) = sibling {
                proof.push(ProofEntry::sided(side, self.layers[layer][sibling].clone()));
            }
            index = parent;
        }
        proof
    }

    /// Proof for `leaf`. Without an explicit index the first matching leaf
    /// is used; an absent leaf yields an empty proof.
    pub fn proof(&self, leaf: impl ToCanonicalBytes, index: Option<usize>) -> Vec<ProofEntry> {
        match index.or_else(|| self.leaf_index(leaf)) {
            Some(index) => self.proof_at(index),
            None => Vec::new(),
        }
    }

    /// Sibling hashes of [`proof`](Self::proof) as hex strings.
    pub fn hex_proof(&self, leaf: impl ToCanonicalBytes, index: Option<usize>) -> Vec<String> {
        self.proof(leaf, index)
            .iter()
            .map(|entry| entry.data().to_hex())
            .collect()
    }

    /// `[side_bit, hex]` pairs, 0 meaning left.
    pub fn positional_hex_proof(
        &self,
        leaf: impl ToCanonicalBytes,
        index: Option<usize>,
    ) -> Vec<(u8, String)> {
        self.proof(leaf, index)
            .iter()
            .map(|entry| (if entry.is_left() { 0 } else { 1 }, entry.data().to_hex()))
            .collect()
    }

    /// Proofs for every leaf, in leaf order, from one depth-first traversal.
    pub fn proofs(&self) -> Vec<Vec<ProofEntry>> {
        let mut proofs = Vec::with_capacity(self.leaves.len());
        if self.leaves.is_empty() {
            return proofs;
        }
        let mut path = Vec::new();
        self.collect_proofs(self.layers.len() - 1, 0, &mut path, &mut proofs);
        proofs
    }

    fn collect_proofs(
        &self,
        layer: usize,
        index: usize,
        path: &mut Vec<ProofEntry>,
        proofs: &mut Vec<Vec<ProofEntry>>,
    ) {
        let pushed = match self.step(layer, index).0 {
            Some((sibling, side)) => {
                path.push(ProofEntry::sided(side, self.layers[layer][sibling].clone()));
                true
            }
            None => false,
        };
        if layer == 0 {
            proofs.push(path.iter().rev().cloned().collect());
        } else {
            for child in self.children_of(layer, index) {
                self.collect_proofs(layer - 1, child, path, proofs);
            }
        }
        if pushed {
            path.pop();
        }
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Fold `proof` from `leaf` and compare the result with `root`.
    pub fn verify(
        &self,
        proof: &[ProofEntry],
        leaf: impl ToCanonicalBytes,
        root: impl ToCanonicalBytes,
    ) -> bool {
        let mut hash: Hash = leaf.to_canonical_bytes().into();
        for entry in proof {
            hash = if entry.is_left() {
                self.combine(entry.data(), &hash)
            } else {
                self.combine(&hash, entry.data())
            };
        }
        hash.as_bytes() == root.to_canonical_bytes().as_bytes()
    }
}

/// Verify a single-leaf proof without building a tree.
pub fn verify_proof<H: Hasher>(
    proof: &[ProofEntry],
    leaf: impl ToCanonicalBytes,
    root: impl ToCanonicalBytes,
    hasher: H,
    options: TreeOptions,
) -> Result<bool> {
    let tree = MerkleTree::new(Vec::<Hash>::new(), hasher, options)?;
    Ok(tree.verify(proof, leaf, root))
}
