//! # Multiproofs
//!
//! Proofs covering several leaves at once, with shared siblings elided.
//!
//! ## Balanced trees
//!
//! When the leaf count is a power of two, or the tree is `complete`, every
//! node has a binary-heap position: the root is 1 and the children of `p`
//! are `2p` and `2p + 1`. With `m = 2^ceil(log2 n)`, leaf `i` sits at
//! `m + i` if it is paired at layer 0 and at `m + i - n` if it was carried
//! up. Proofs are sets of heap positions, derived by
//! [`heap_proof_indices`].
//!
//! ## Uneven trees
//!
//! Any other leaf count uses per-layer sibling lists
//! ([`proof_indices_for_uneven_tree`]), and verification folds explicit
//! `(index, hash)` pairs layer by layer, applying the tree's odd-node rule
//! to a lone trailing node.
//!
//! ## Flag multiproofs
//!
//! [`MerkleTree::multi_proof_for_leaves`], [`MerkleTree::proof_flags`] and
//! [`MerkleTree::verify_multi_proof_with_flags`] implement the value-based
//! variant: an ordered proof list plus one flag per combination step saying
//! whether the second operand comes from the leaf/hash pools or from the
//! proof list. Pairs are always sorted in this variant.
//!
//! The replay draws every leaf before any computed hash, so it can only
//! follow trees where each target path is paired at every layer below the
//! root. A target that is promoted, carried up by `complete` layering, or
//! paired with itself makes proof and flag generation fail with
//! [`ProofError::UnpairedNode`] instead of producing flags that cannot
//! verify. The tree must also sort pairs and must not use the bitcoin
//! convention.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use accum_core::bits;
use accum_core::hash::concat;
use accum_core::{AccumError, ConfigError, Hash, Hasher, ProofError, Result, ToCanonicalBytes};

use crate::tree::MerkleTree;

// ---------------------------------------------------------------------------
// Index derivation
// ---------------------------------------------------------------------------

/// Heap position of leaf `index` in a balanced tree of `leaf_count` leaves.
pub fn heap_position(index: usize, leaf_count: usize) -> u64 {
    let n = leaf_count as u64;
    let m = bits::next_power_of_two(n);
    let i = index as u64;
    if i < 2 * n - m {
        m + i
    } else {
        m + i - n
    }
}

/// Minimal heap positions needed to recompute the root from `targets`.
///
/// Every XOR-sibling on every target's path is a candidate. Candidates are
/// visited deepest first; a position whose subtree is already covered is
/// redundant. Targets themselves are never part of the result.
pub fn heap_proof_indices(targets: &[u64]) -> Vec<u64> {
    let mut maximal = BTreeSet::new();
    for &target in targets {
        let mut x = target;
        while x > 1 {
            maximal.insert(x ^ 1);
            x /= 2;
        }
    }
    let mut redundant = HashSet::new();
    let mut proof = Vec::new();
    for mut index in targets.iter().copied().chain(maximal.into_iter().rev()) {
        if redundant.contains(&index) {
            continue;
        }
        proof.push(index);
        while index > 1 {
            redundant.insert(index);
            if !redundant.contains(&(index ^ 1)) {
                break;
            }
            index /= 2;
        }
    }
    let targets: HashSet<u64> = targets.iter().copied().collect();
    proof.retain(|index| !targets.contains(index));
    proof
}

/// Per-layer sibling indices needed for `leaf_indices` in an uneven tree.
///
/// A sibling is listed when it exists in its layer and is not itself on a
/// target path. The lone trailing node of an odd-length layer has no
/// sibling to list.
pub fn proof_indices_for_uneven_tree(leaf_indices: &[usize], leaf_count: usize) -> Vec<Vec<usize>> {
    let mut nodes: Vec<usize> = leaf_indices.to_vec();
    nodes.sort_unstable();
    nodes.dedup();
    let mut len = leaf_count;
    let mut layers = Vec::new();
    while len > 1 {
        let present: HashSet<usize> = nodes.iter().copied().collect();
        layers.push(
            nodes
                .iter()
                .map(|index| index ^ 1)
                .filter(|sibling| *sibling < len && !present.contains(sibling))
                .collect(),
        );
        // Even and odd children share the parent index / 2.
        nodes = nodes.iter().map(|index| index / 2).collect();
        nodes.dedup();
        len = (len + 1) / 2;
    }
    layers
}

fn is_balanced(leaf_count: usize, complete: bool) -> bool {
    complete || bits::is_power_of_two(leaf_count as u64)
}

impl<H: Hasher> MerkleTree<H> {
    // -----------------------------------------------------------------------
    // Index-based multiproofs
    // -----------------------------------------------------------------------

    /// True when multiproofs use the per-layer algorithm.
    pub fn is_uneven(&self) -> bool {
        !is_balanced(self.leaves.len(), self.options.complete)
    }

    /// Heap positions of the proof for leaves at `indices` (balanced trees).
    pub fn proof_indices(&self, indices: &[usize]) -> Result<Vec<u64>> {
        self.check_indices(indices)?;
        let targets: Vec<u64> = indices
            .iter()
            .map(|&i| heap_position(i, self.leaves.len()))
            .collect();
        Ok(heap_proof_indices(&targets))
    }

    /// Multiproof for the leaves at `indices`.
    pub fn multi_proof(&self, indices: &[usize]) -> Result<Vec<Hash>> {
        self.check_indices(indices)?;
        if self.is_uneven() {
            tracing::warn!(
                leaves = self.leaves.len(),
                "multiproof over an uneven tree; build with `complete` for balanced proofs"
            );
            return Ok(self.uneven_multi_proof(indices));
        }
        self.proof_indices(indices)?
            .into_iter()
            .map(|position| {
                self.heap_node(position)
                    .cloned()
                    .ok_or(AccumError::IndexOutOfRange {
                        index: position,
                        size: 2 * self.leaves.len() as u64,
                    })
            })
            .collect()
    }

    /// Hex form of [`multi_proof`](Self::multi_proof).
    pub fn hex_multi_proof(&self, indices: &[usize]) -> Result<Vec<String>> {
        Ok(self.multi_proof(indices)?.iter().map(Hash::to_hex).collect())
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        if indices.is_empty() {
            return Err(ProofError::EmptyTargets.into());
        }
        let size = self.leaves.len();
        match indices.iter().find(|&&i| i >= size) {
            Some(&index) => Err(AccumError::IndexOutOfRange {
                index: index as u64,
                size: size as u64,
            }),
            None => Ok(()),
        }
    }

    fn uneven_multi_proof(&self, indices: &[usize]) -> Vec<Hash> {
        proof_indices_for_uneven_tree(indices, self.leaves.len())
            .into_iter()
            .enumerate()
            .flat_map(|(layer, siblings)| {
                siblings
                    .into_iter()
                    .map(move |index| self.layers[layer][index].clone())
            })
            .collect()
    }

    /// Node at heap position `position` of a balanced tree.
    fn heap_node(&self, position: u64) -> Option<&Hash> {
        if position == 0 {
            return None;
        }
        let depth = bits::ceil_log2(self.leaves.len() as u64);
        let level = u64::BITS - 1 - position.leading_zeros();
        let offset = (position - (1u64 << level)) as usize;
        let layer = depth.checked_sub(level)? as usize;
        if layer == 0 && offset >= self.first_layer_limit() {
            return None;
        }
        self.layers.get(layer)?.get(offset)
    }

    // -----------------------------------------------------------------------
    // Index-based verification
    // -----------------------------------------------------------------------

    /// Recompute the root from `leaves` at `indices` and the multiproof.
    ///
    /// An empty target set, mismatched lengths, or leftover proof hashes
    /// all fail verification.
    pub fn verify_multi_proof(
        &self,
        root: &Hash,
        indices: &[usize],
        leaves: &[Hash],
        leaf_count: usize,
        proof: &[Hash],
    ) -> bool {
        if indices.is_empty() || indices.len() != leaves.len() {
            return false;
        }
        if indices.iter().any(|&i| i >= leaf_count) {
            return false;
        }
        if !is_balanced(leaf_count, self.options.complete) {
            return self.verify_multi_proof_for_uneven_tree(root, indices, leaves, leaf_count, proof);
        }
        let targets: Vec<u64> = indices
            .iter()
            .map(|&i| heap_position(i, leaf_count))
            .collect();
        let proof_positions = heap_proof_indices(&targets);
        if proof_positions.len() != proof.len() {
            return false;
        }
        let mut known: BTreeMap<u64, Hash> = targets.into_iter().zip(leaves.iter().cloned()).collect();
        known.extend(proof_positions.into_iter().zip(proof.iter().cloned()));

        // Children have larger positions than parents, so deepest first.
        let mut pending: BTreeSet<u64> = known.keys().copied().collect();
        while let Some(position) = pending.pop_last() {
            if position <= 1 {
                break;
            }
            let left = position & !1;
            let (Some(l), Some(r)) = (known.get(&left), known.get(&(left + 1))) else {
                continue;
            };
            let parent = self.combine(l, r);
            pending.remove(&left);
            pending.insert(position / 2);
            known.insert(position / 2, parent);
        }
        known.get(&1) == Some(root)
    }

    /// Verification for trees whose leaf count is not a power of two.
    pub fn verify_multi_proof_for_uneven_tree(
        &self,
        root: &Hash,
        indices: &[usize],
        leaves: &[Hash],
        leaf_count: usize,
        proof: &[Hash],
    ) -> bool {
        self.root_for_uneven_tree(indices, leaves, leaf_count, proof)
            .map_or(false, |computed| &computed == root)
    }

    /// Fold `(index, hash)` pairs up an uneven tree; `None` if the proof
    /// does not fit the shape implied by `leaf_count`.
    pub fn root_for_uneven_tree(
        &self,
        indices: &[usize],
        leaves: &[Hash],
        leaf_count: usize,
        proof: &[Hash],
    ) -> Option<Hash> {
        if indices.is_empty() || indices.len() != leaves.len() {
            return None;
        }
        let mut layer: BTreeMap<usize, Hash> = indices.iter().copied().zip(leaves.iter().cloned()).collect();
        let keys: Vec<usize> = layer.keys().copied().collect();
        let sibling_layers = proof_indices_for_uneven_tree(&keys, leaf_count);
        if sibling_layers.iter().map(Vec::len).sum::<usize>() != proof.len() {
            return None;
        }
        let mut supplied = proof.iter();
        let mut len = leaf_count;
        for siblings in sibling_layers {
            for index in siblings {
                layer.insert(index, supplied.next()?.clone());
            }
            let parents: BTreeSet<usize> = layer.keys().map(|index| index / 2).collect();
            let mut next = BTreeMap::new();
            for parent in parents {
                let left = layer.get(&(2 * parent))?;
                let hash = match layer.get(&(2 * parent + 1)) {
                    Some(right) => self.combine(left, right),
                    None if 2 * parent + 1 >= len => self.lone(left),
                    None => return None,
                };
                next.insert(parent, hash);
            }
            layer = next;
            len = (len + 1) / 2;
        }
        layer.remove(&0)
    }

    // -----------------------------------------------------------------------
    // Value-based multiproofs and flags
    // -----------------------------------------------------------------------

    fn positions_of<T: ToCanonicalBytes>(&self, values: &[T]) -> Result<Vec<usize>> {
        let mut ids = values
            .iter()
            .map(|value| {
                let bytes = value.to_canonical_bytes();
                self.leaf_index(&bytes)
                    .ok_or_else(|| AccumError::leaf_not_found(Hash::from(bytes).to_hex()))
            })
            .collect::<Result<Vec<_>>>()?;
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Reject trees and targets the flag replay cannot follow. `ids` must
    /// be sorted and free of duplicates.
    fn check_flag_paths(&self, ids: &[usize]) -> Result<()> {
        if !self.options.sort_pairs {
            return Err(ConfigError::Required {
                option: "sortPairs",
                operation: "flag multiproof",
            }
            .into());
        }
        if self.options.is_bitcoin_tree {
            return Err(ConfigError::Incompatible {
                option: "isBitcoinTree",
                conflicting: "flag multiproof",
            }
            .into());
        }
        let mut ids = ids.to_vec();
        for layer in 0..self.layers.len().saturating_sub(1) {
            let mut next = Vec::with_capacity(ids.len());
            for &index in &ids {
                let (sibling, parent) = self.step(layer, index);
                match sibling {
                    Some((sibling, _)) if sibling != index => next.push(parent),
                    _ => return Err(ProofError::UnpairedNode { layer, index }.into()),
                }
            }
            next.dedup();
            ids = next;
        }
        Ok(())
    }

    /// Multiproof for leaf values, ordered layer by layer.
    ///
    /// Siblings that are themselves on a target path are filtered out.
    /// Fails with [`ProofError::UnpairedNode`] when a target path cannot be
    /// replayed by [`verify_multi_proof_with_flags`](Self::verify_multi_proof_with_flags).
    pub fn multi_proof_for_leaves<T: ToCanonicalBytes>(&self, values: &[T]) -> Result<Vec<Hash>> {
        if values.is_empty() {
            return Err(ProofError::EmptyTargets.into());
        }
        let mut ids = self.positions_of(values)?;
        self.check_flag_paths(&ids)?;
        let mut on_path = HashSet::new();
        let mut proof = Vec::new();
        for layer in 0..self.layers.len() {
            let mut next = Vec::with_capacity(ids.len());
            for &id in &ids {
                on_path.insert(self.layers[layer][id].clone());
                let (sibling, parent) = self.step(layer, id);
                if let Some((sibling, _)) = sibling {
                    proof.push(self.layers[layer][sibling].clone());
                }
                next.push(parent);
            }
            next.dedup();
            ids = next;
        }
        proof.retain(|hash| !on_path.contains(hash));
        Ok(proof)
    }

    /// Flags for [`verify_multi_proof_with_flags`](Self::verify_multi_proof_with_flags):
    /// one per combination, `false` when the step consumes a proof hash.
    pub fn proof_flags(&self, indices: &[usize], proof: &[Hash]) -> Result<Vec<bool>> {
        self.check_indices(indices)?;
        let mut ids = indices.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.check_flag_paths(&ids)?;
        let supplied: HashSet<&Hash> = proof.iter().collect();
        let mut flags = Vec::new();
        for layer in 0..self.layers.len() {
            let mut tested = HashSet::new();
            let mut next = Vec::with_capacity(ids.len());
            for &id in &ids {
                let (sibling, parent) = self.step(layer, id);
                next.push(parent);
                if tested.contains(&id) {
                    continue;
                }
                tested.insert(id);
                if let Some((sibling, _)) = sibling {
                    tested.insert(sibling);
                    let node = &self.layers[layer][id];
                    let pair = &self.layers[layer][sibling];
                    flags.push(!(supplied.contains(node) || supplied.contains(pair)));
                }
            }
            next.dedup();
            ids = next;
        }
        Ok(flags)
    }

    /// [`proof_flags`](Self::proof_flags) for leaf values.
    pub fn proof_flags_for_leaves<T: ToCanonicalBytes>(&self, values: &[T], proof: &[Hash]) -> Result<Vec<bool>> {
        let ids = self.positions_of(values)?;
        self.proof_flags(&ids, proof)
    }

    /// Replay a flag multiproof. Operands are drawn from the leaves first,
    /// then from hashes computed so far; a `false` flag takes the first
    /// operand from the proof list. Each pair is sorted before hashing.
    pub fn verify_multi_proof_with_flags(
        &self,
        root: &Hash,
        leaves: &[Hash],
        proof: &[Hash],
        flags: &[bool],
    ) -> bool {
        if flags.is_empty() {
            return leaves.first().or(proof.first()) == Some(root);
        }
        let mut hashes: Vec<Hash> = Vec::with_capacity(flags.len());
        let (mut leaf_pos, mut hash_pos, mut proof_pos) = (0, 0, 0);
        let mut next_operand = |hashes: &Vec<Hash>| -> Option<Hash> {
            if leaf_pos < leaves.len() {
                leaf_pos += 1;
                Some(leaves[leaf_pos - 1].clone())
            } else {
                hash_pos += 1;
                hashes.get(hash_pos - 1).cloned()
            }
        };
        for &flag in flags {
            let a = if flag {
                next_operand(&hashes)
            } else {
                proof_pos += 1;
                proof.get(proof_pos - 1).cloned()
            };
            let b = next_operand(&hashes);
            let (Some(a), Some(b)) = (a, b) else {
                return false;
            };
            let (lo, hi) = if b < a { (b, a) } else { (a, b) };
            hashes.push(self.hash(&concat([lo.as_bytes(), hi.as_bytes()])));
        }
        hashes.last() == Some(root)
    }
}
