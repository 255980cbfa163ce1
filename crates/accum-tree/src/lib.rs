//! # accum-tree — Binary Merkle Tree
//!
//! A layered hash tree over an ordered leaf sequence, with single-leaf
//! proofs, multiproofs, flag multiproofs, and a JSON codec.
//!
//! ## Variants
//!
//! Behaviour is selected by one immutable [`TreeOptions`] value:
//!
//! - `hashLeaves`, `sortLeaves`, `sortPairs`, `sort` shape the input.
//! - `duplicateOdd` pairs a lone trailing node with itself.
//! - `isBitcoinTree` byte-reverses operands, double-hashes each pair, and
//!   reverses the result.
//! - `complete` keeps non-power-of-two trees maximally balanced.
//! - `fillDefaultHash` pads the leaves to a power of two.
//!
//! ## Verification results
//!
//! Verification of a well-formed proof that does not reach the root returns
//! `false`. Only malformed requests (no targets, out-of-range indices,
//! absent leaves, invalid options) are errors.
//!
//! ## Crate Policy
//!
//! - Depends only on `accum-core` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod codec;
pub mod multiproof;
pub mod options;
pub mod proof;
mod render;
pub mod tree;

pub use codec::{
    marshal_leaves, marshal_proof, marshal_tree, unmarshal_leaves, unmarshal_proof,
    unmarshal_tree, MarshalledTree,
};
pub use multiproof::{heap_proof_indices, proof_indices_for_uneven_tree};
pub use options::{DefaultFill, TreeOptions};
pub use proof::{ProofEntry, Side};
pub use tree::{verify_proof, MerkleTree};
