//! # Peaks, Peak Maps and Roll-Up
//!
//! A width plus its peak hashes is a complete summary of an MMR: enough to
//! bag the root, and enough to derive the root after further appends
//! without any historical node.
//!
//! A [`PeakMap`] stores the peaks by height. Bit `b` of the width is set
//! exactly when a mountain of height `b + 1` exists, and slot `b` then holds
//! its peak. Appending a leaf carries upward like binary increment: the new
//! leaf merges with each existing peak until it reaches an empty height.
//!
//! ## Security Invariant
//!
//! [`roll_up`] checks the claimed root against the supplied peaks before
//! extending them. A verifier never extends a summary it has not bagged.

use accum_core::bits;
use accum_core::{AccumError, Hash, ProofError, Result};

use crate::hasher::MountainHasher;

/// Number of heights a [`PeakMap`] can hold.
pub const PEAK_MAP_HEIGHTS: usize = 32;

/// Largest width a [`PeakMap`] can summarize.
pub const MAX_WIDTH: u64 = u32::MAX as u64;

/// Peaks indexed by `height - 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakMap([Option<Hash>; PEAK_MAP_HEIGHTS]);

impl PeakMap {
    /// Peak of the mountain of the given height (1-based), if present.
    pub fn get(&self, height: u32) -> Option<&Hash> {
        let slot = usize::try_from(height).ok()?.checked_sub(1)?;
        self.0.get(slot)?.as_ref()
    }

    /// Number of peaks present.
    pub fn len(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_width(width: u64) -> Result<()> {
    if width > MAX_WIDTH {
        return Err(AccumError::IndexOutOfRange {
            index: width,
            size: MAX_WIDTH,
        });
    }
    Ok(())
}

/// Bag `peaks` into the root of an MMR of `width` leaves.
///
/// The empty MMR has the empty root.
pub fn bag<M: MountainHasher + ?Sized>(hasher: &M, width: u64, peaks: &[Hash]) -> Result<Hash> {
    check_width(width)?;
    let expected = bits::num_of_peaks(width);
    if peaks.len() != expected {
        return Err(ProofError::PeakCount {
            expected,
            actual: peaks.len(),
        }
        .into());
    }
    if width == 0 {
        return Ok(Hash::empty());
    }
    Ok(hasher.bag_peaks(bits::mmr_size(width), peaks))
}

/// Spread left-to-right `peaks` over the heights set in `width`.
pub fn peaks_to_peak_map(width: u64, peaks: &[Hash]) -> Result<PeakMap> {
    check_width(width)?;
    let expected = bits::num_of_peaks(width);
    if peaks.len() != expected {
        return Err(ProofError::PeakCount {
            expected,
            actual: peaks.len(),
        }
        .into());
    }
    let mut map = PeakMap::default();
    // Rightmost peak is the lowest set bit.
    let mut remaining = peaks.iter().rev();
    for bit in 0..PEAK_MAP_HEIGHTS {
        if width & (1u64 << bit) != 0 {
            map.0[bit] = remaining.next().cloned();
        }
    }
    Ok(map)
}

/// Peaks of `map`, tallest mountain first.
pub fn peak_map_to_peaks(width: u64, map: &PeakMap) -> Result<Vec<Hash>> {
    let peaks: Vec<Hash> = map.0.iter().rev().flatten().cloned().collect();
    let expected = bits::num_of_peaks(width);
    if peaks.len() != expected {
        return Err(ProofError::PeakCount {
            expected,
            actual: peaks.len(),
        }
        .into());
    }
    Ok(peaks)
}

/// The peak map after appending a leaf whose data hashes to `item_hash`
/// to an MMR of `width` leaves.
///
/// The new leaf's position is [`bits::leaf_index`] of the new width, and
/// each merge with an existing peak creates the node one position further.
pub fn peak_update<M: MountainHasher + ?Sized>(
    hasher: &M,
    width: u64,
    prev: &PeakMap,
    item_hash: &Hash,
) -> Result<PeakMap> {
    let new_width = width + 1;
    check_width(new_width)?;
    let mut next = PeakMap::default();
    let mut cursor_index = bits::leaf_index(new_width);
    let mut cursor = hasher.hash_leaf(cursor_index, item_hash);
    let mut obtained = false;
    for bit in 0..PEAK_MAP_HEIGHTS {
        if obtained {
            next.0[bit] = prev.0[bit].clone();
            continue;
        }
        let mask = 1u64 << bit;
        let prev_exists = width & mask != 0;
        cursor_index += 1;
        if prev_exists {
            let peak = prev.0[bit].as_ref().ok_or(ProofError::PeakCount {
                expected: bits::num_of_peaks(width),
                actual: prev.len(),
            })?;
            cursor = hasher.hash_branch(cursor_index, peak, &cursor);
        }
        if new_width & mask != 0 {
            // Incrementing clears every lower set bit, so a set bit here
            // was clear before and the cursor becomes the new peak.
            next.0[bit] = Some(cursor.clone());
            obtained = true;
        }
    }
    Ok(next)
}

/// Root after appending `item_hashes` to the MMR summarized by `root`,
/// `width` and `peaks`.
///
/// Returns `None` when `root` does not bag from `peaks`; malformed peak
/// sets are errors.
pub fn roll_up<M: MountainHasher + ?Sized>(
    hasher: &M,
    root: &Hash,
    width: u64,
    peaks: &[Hash],
    item_hashes: &[Hash],
) -> Result<Option<Hash>> {
    if &bag(hasher, width, peaks)? != root {
        tracing::debug!(width, "roll-up rejected: root does not bag from peaks");
        return Ok(None);
    }
    let mut map = peaks_to_peak_map(width, peaks)?;
    let mut width = width;
    for item in item_hashes {
        map = peak_update(hasher, width, &map, item)?;
        width += 1;
    }
    let peaks = peak_map_to_peaks(width, &map)?;
    bag(hasher, width, &peaks).map(Some)
}
