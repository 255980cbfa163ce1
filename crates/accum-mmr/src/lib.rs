//! # accum-mmr — Merkle Mountain Range
//!
//! An append-only accumulator over a forest of perfect binary subtrees.
//!
//! - [`Mmr`] appends leaves, memoizes nodes by position, produces and
//!   verifies [`MmrProof`]s.
//! - [`peaks`] holds the width-plus-peaks summary: bagging, the per-height
//!   [`PeakMap`], [`peak_update`] and [`roll_up`]. A verifier holding only a
//!   summary can check a proposed future root with these alone.
//! - [`MountainHasher`] defines the leaf, branch and bagging hashes; any
//!   `accum-core` [`Hasher`](accum_core::Hasher) gets position-keyed
//!   defaults, and [`MountainFns`] overrides them with closures.
//!
//! ## Crate Policy
//!
//! - Depends only on `accum-core` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Widths are bounded by [`peaks::MAX_WIDTH`].

pub mod hasher;
pub mod mmr;
pub mod peaks;

pub use accum_core::bits::{height_at, leaf_index, mountain_height, num_of_peaks};
pub use hasher::{MountainFns, MountainHasher};
pub use mmr::{children, is_leaf, Mmr, MmrProof};
pub use peaks::{peak_map_to_peaks, peak_update, peaks_to_peak_map, roll_up, PeakMap};
