//! # Bit and Height Arithmetic
//!
//! Index-space helpers shared by the binary tree and the Merkle Mountain
//! Range. MMR positions are 1-based and numbered in pre-order across
//! mountains: a perfect subtree of height `h` (a single leaf has height 1)
//! occupies `2^h - 1` contiguous positions and its peak is the last of them.
//!
//! ```text
//! height 3:          7
//!                  /   \
//! height 2:       3     6          10
//!                / \   / \        /  \
//! height 1:     1   2 4   5      8    9    11
//! ```

/// Returns true if `n` is a power of two (zero is not).
pub fn is_power_of_two(n: u64) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// `ceil(log2(n))`, with `ceil_log2(0) == 0` and `ceil_log2(1) == 0`.
pub fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        u64::BITS - (n - 1).leading_zeros()
    }
}

/// The smallest power of two `>= n`, with `0` for `n == 0`.
pub fn next_power_of_two(n: u64) -> u64 {
    if n == 0 {
        0
    } else {
        1u64 << ceil_log2(n)
    }
}

/// Number of mountains (and peaks) in an MMR of `width` leaves.
pub fn num_of_peaks(width: u64) -> usize {
    width.count_ones() as usize
}

/// Total node count of an MMR of `width` leaves: `2 * width - popcount(width)`.
pub fn mmr_size(width: u64) -> u64 {
    (width << 1) - u64::from(width.count_ones())
}

/// Positions of all peaks for `width` leaves, leftmost (tallest) mountain first.
///
/// Each set bit `i` of `width`, from the most significant down, contributes a
/// mountain of `2^(i+1) - 1` positions whose peak is the running total.
pub fn peak_indexes(width: u64) -> Vec<u64> {
    let mut peaks = Vec::with_capacity(num_of_peaks(width));
    let mut size = 0u64;
    for bit in (0..u64::BITS).rev() {
        if width & (1u64 << bit) != 0 {
            size += (1u64 << (bit + 1)) - 1;
            peaks.push(size);
        }
    }
    peaks
}

/// The largest `h` with `2^h <= size + h`: the height of the mountain rooted
/// at the start of the index space that [`height_at`] descends into.
pub fn mountain_height(size: u64) -> u32 {
    let mut height = 1u32;
    while height < u64::BITS - 1 && (1u64 << height) <= size + u64::from(height) {
        height += 1;
    }
    height - 1
}

/// Height of the node at 1-based `index`; leaves have height 1.
///
/// Whole mountains to the left are subtracted until the index lies in the
/// tallest mountain that starts at position 1; the height then follows from
/// the distance to that mountain's peak along its right slope.
pub fn height_at(index: u64) -> u32 {
    let mut reduced = index;
    let mut peak = 0u64;
    let mut height = 0u32;
    while reduced > peak {
        reduced -= (1u64 << height) - 1;
        height = mountain_height(reduced);
        peak = (1u64 << height) - 1;
    }
    // `peak - reduced` is bounded by the height on the right slope.
    height - (peak - reduced) as u32
}

/// Position at which the leaf completing `width` leaves is stored.
pub fn leaf_index(width: u64) -> u64 {
    if width % 2 == 1 {
        mmr_size(width)
    } else {
        mmr_size(width - 1) + 1
    }
}
