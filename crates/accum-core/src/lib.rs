//! # accum-core — Shared Primitives for Hash Accumulators
//!
//! This crate is the leaf of the accumulator workspace. It defines the value
//! types and adapters that both the binary Merkle tree (`accum-tree`) and the
//! Merkle Mountain Range (`accum-mmr`) are built on. It depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **One hash type.** [`Hash`] is an opaque byte string with lexicographic
//!    ordering. Nodes, roots, peaks and proof entries are all `Hash`.
//!
//! 2. **`CanonicalBytes` for caller input.** Byte buffers, hex strings, text,
//!    decimal numbers and big integers are normalized once, by the rules in
//!    [`canonical`], before they reach a hash function.
//!
//! 3. **Pluggable hash function.** Structures are generic over [`Hasher`].
//!    SHA-256 via `sha2` is the default; closures are adapted by [`FnHasher`].
//!
//! 4. **Errors mean malformed input.** A well-formed proof that fails to
//!    verify is reported as `false`, never as an [`AccumError`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `accum-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod bits;
pub mod canonical;
pub mod error;
pub mod hash;
pub mod hasher;

pub use canonical::{CanonicalBytes, ToCanonicalBytes};
pub use error::{AccumError, ConfigError, ProofError, Result};
pub use hash::Hash;
pub use hasher::{
    DigestHasher, FnHasher, HashOutput, Hasher, IdentityHasher, Sha256Hasher, Sha512Hasher,
};
