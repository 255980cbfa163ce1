//! # Merkle Mountain Range (MMR) Integration Tests
//!
//! Tests the MMR through its public surface:
//! - Empty MMR behavior
//! - The three-leaf identity-hash scenario, node by node
//! - Inclusion proofs for every leaf, across widths
//! - Roll-up of a peak summary against real appends
//! - Peak map conversions
//! - Custom hash roles

use accum_core::{bits, AccumError, CanonicalBytes, Hash, Hasher, IdentityHasher, Sha256Hasher};
use accum_mmr::{
    children, is_leaf, peak_map_to_peaks, peak_update, peaks_to_peak_map, roll_up, Mmr,
    MountainFns, MountainHasher, PeakMap,
};
use proptest::prelude::*;

fn h(bytes: &[u8]) -> Hash {
    Hash::from_bytes(bytes.to_vec())
}

// ---------------------------------------------------------------------------
// 1. Empty MMR
// ---------------------------------------------------------------------------

#[test]
fn mmr_empty_has_empty_root() {
    let mmr = Mmr::sha256();
    assert_eq!(mmr.width(), 0);
    assert_eq!(mmr.size(), 0);
    assert!(mmr.root().is_empty());
    assert!(matches!(
        mmr.merkle_proof(1),
        Err(AccumError::IndexOutOfRange { index: 1, size: 0 })
    ));
}

// ---------------------------------------------------------------------------
// 2. Identity-hash scenario
// ---------------------------------------------------------------------------

#[test]
fn mmr_three_leaves_with_identity_hash() {
    let mmr = Mmr::from_leaves(["01", "02", "03"], IdentityHasher).unwrap();
    assert_eq!(mmr.width(), 3);
    assert_eq!(mmr.size(), 4);
    assert_eq!(bits::peak_indexes(3), vec![3, 4]);

    assert_eq!(mmr.node(1), Some(&h(&[0x01, 0x01])));
    assert_eq!(mmr.node(2), Some(&h(&[0x02, 0x02])));
    assert_eq!(mmr.node(3), Some(&h(&[0x03, 0x01, 0x01, 0x02, 0x02])));
    assert_eq!(mmr.node(4), Some(&h(&[0x04, 0x03])));

    // bag = size || peak of leaves 1-2 || peak of leaf 3
    assert_eq!(mmr.hex_root(), "0x0403010102020403");
}

#[test]
fn mmr_root_changes_on_every_append() {
    let mut mmr = Mmr::sha256();
    let mut seen = Vec::new();
    for i in 0..10u64 {
        mmr.append(i).unwrap();
        assert!(!seen.contains(mmr.root()));
        seen.push(mmr.root().clone());
    }
    assert_eq!(mmr.width(), 10);
    assert_eq!(mmr.size(), bits::mmr_size(10));
}

#[test]
fn mmr_deterministic() {
    let a = Mmr::from_leaves(["aa", "bb", "cc", "dd", "ee"], Sha256Hasher::new()).unwrap();
    let b = Mmr::from_leaves(["aa", "bb", "cc", "dd", "ee"], Sha256Hasher::new()).unwrap();
    assert_eq!(a.root(), b.root());
    assert_eq!(a.peaks(), b.peaks());
}

// ---------------------------------------------------------------------------
// 3. Inclusion proofs
// ---------------------------------------------------------------------------

#[test]
fn mmr_every_leaf_proves_for_widths_up_to_33() {
    for width in 1..=33u64 {
        let mmr = Mmr::from_leaves(0..width, Sha256Hasher::new()).unwrap();
        for leaf in 1..=width {
            let index = bits::leaf_index(leaf);
            assert!(is_leaf(index));
            let proof = mmr.merkle_proof(index).unwrap();
            assert_eq!(proof.width, width);
            assert_eq!(proof.peak_bagging.len(), bits::num_of_peaks(width));
            assert!(
                mmr.verify(mmr.root(), width, index, leaf - 1, &proof.peak_bagging, &proof.siblings)
                    .unwrap(),
                "width={width} leaf={leaf}"
            );
        }
    }
}

#[test]
fn mmr_proof_verifies_with_a_fresh_instance() {
    let mmr = Mmr::from_leaves(["01", "02", "03", "04", "05", "06", "07"], Sha256Hasher::new()).unwrap();
    let proof = mmr.merkle_proof(9).unwrap();
    let verifier = Mmr::sha256();
    assert!(verifier.verify_proof(&proof, 9, "06").unwrap());
    assert!(!verifier.verify_proof(&proof, 9, "07").unwrap());
}

#[test]
fn mmr_children_walk_reaches_every_leaf_once() {
    let mmr = Mmr::from_leaves(0..8u64, Sha256Hasher::new()).unwrap();
    let mut stack = vec![15u64];
    let mut leaves = Vec::new();
    while let Some(index) = stack.pop() {
        assert!(mmr.node(index).is_some());
        match children(index) {
            Ok((left, right)) => {
                stack.push(right);
                stack.push(left);
            }
            Err(AccumError::NotAParent(_)) => leaves.push(index),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(leaves, vec![1, 2, 4, 5, 8, 9, 11, 12]);
}

// ---------------------------------------------------------------------------
// 4. Roll-up
// ---------------------------------------------------------------------------

#[test]
fn mmr_peak_map_round_trip() {
    let mmr = Mmr::from_leaves(0..11u64, Sha256Hasher::new()).unwrap();
    let map = peaks_to_peak_map(11, &mmr.peaks()).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(peak_map_to_peaks(11, &map).unwrap(), mmr.peaks());
}

#[test]
fn mmr_peak_update_matches_append() {
    let hasher = Sha256Hasher::new();
    let mut mmr = Mmr::new(hasher);
    let mut map = PeakMap::default();
    for i in 0..20u64 {
        let item = hasher.hash(CanonicalBytes::new(&i).as_bytes());
        map = peak_update(&hasher, i, &map, &item).unwrap();
        mmr.append(i).unwrap();
        assert_eq!(peak_map_to_peaks(i + 1, &map).unwrap(), mmr.peaks(), "width {}", i + 1);
    }
}

#[test]
fn mmr_roll_up_rejects_tampered_peaks() {
    let hasher = Sha256Hasher::new();
    let mmr = Mmr::from_leaves(["01", "02", "03"], hasher).unwrap();
    let mut peaks = mmr.peaks();
    peaks[1] = hasher.hash(b"forged");
    let result = roll_up(&hasher, mmr.root(), 3, &peaks, &[hasher.hash(&[4])]).unwrap();
    assert!(result.is_none());

    let err = roll_up(&hasher, mmr.root(), 3, &peaks[..1], &[]).unwrap_err();
    assert!(matches!(err, AccumError::MalformedProof(_)));
}

#[test]
fn mmr_roll_up_rejects_width_beyond_peak_map() {
    let hasher = Sha256Hasher::new();
    let peak = hasher.hash(b"peak");
    let err = roll_up(&hasher, &peak, 1 << 63, &[peak.clone()], &[]).unwrap_err();
    assert!(matches!(err, AccumError::IndexOutOfRange { .. }));
    assert!(Mmr::sha256().peak_bagging(1 << 63, &[peak]).is_err());
}

proptest! {
    /// `roll_up` over a prior summary equals appending the same items.
    #[test]
    fn mmr_roll_up_equals_append(
        prior in prop::collection::vec(any::<u64>(), 0..24),
        items in prop::collection::vec(any::<u64>(), 0..24),
    ) {
        let hasher = Sha256Hasher::new();
        let mut mmr = Mmr::from_leaves(prior.iter().copied(), hasher).unwrap();
        let (root, width, peaks) = (mmr.root().clone(), mmr.width(), mmr.peaks());
        let item_hashes: Vec<Hash> = items
            .iter()
            .map(|i| hasher.hash(CanonicalBytes::new(i).as_bytes()))
            .collect();
        for i in &items {
            mmr.append(*i).unwrap();
        }
        let rolled = roll_up(&hasher, &root, width, &peaks, &item_hashes).unwrap();
        prop_assert_eq!(rolled.as_ref(), Some(mmr.root()));
    }
}

// ---------------------------------------------------------------------------
// 5. Custom hash roles
// ---------------------------------------------------------------------------

#[test]
fn mmr_custom_bagging_and_branch() {
    let fns = MountainFns::new(Sha256Hasher::new())
        .with_bagging(|size, peaks| {
            let mut data = size.to_be_bytes().to_vec();
            for peak in peaks {
                data.extend_from_slice(peak.as_bytes());
            }
            Sha256Hasher::new().hash(&data)
        })
        .with_branch(|_, left, right| {
            Sha256Hasher::new().hash(&[left.as_bytes(), right.as_bytes()].concat())
        });
    let mmr = Mmr::from_leaves(["0a", "0b", "0c", "0d", "0e"], fns.clone()).unwrap();
    let default = Mmr::from_leaves(["0a", "0b", "0c", "0d", "0e"], Sha256Hasher::new()).unwrap();
    assert_ne!(mmr.root(), default.root());
    // Leaf hashing keeps its default.
    assert_eq!(mmr.node(1), default.node(1));
    assert_eq!(
        fns.hash_leaf(1, &Sha256Hasher::new().hash(&[0x0a])),
        Sha256Hasher::new().hash_leaf(1, &Sha256Hasher::new().hash(&[0x0a]))
    );

    for (leaf, value) in [(1u64, "0a"), (5, "0d"), (8, "0e")] {
        let proof = mmr.merkle_proof(leaf).unwrap();
        assert!(mmr.verify_proof(&proof, leaf, value).unwrap());
    }
}
