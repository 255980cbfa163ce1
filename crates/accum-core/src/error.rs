//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared by every accumulator crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every error is a contract violation by the caller. Nothing here is
//!   transient, so there is no retry classification.
//! - A proof that is well formed but does not hash to the expected root is
//!   NOT an error. Verification reports that as `false` (or `None`), keeping
//!   "malformed input" and "unverifiable input" apart.

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T, E = AccumError> = std::result::Result<T, E>;

/// Top-level error type for the accumulator crates.
#[derive(Error, Debug)]
pub enum AccumError {
    /// Incompatible or invalid construction options.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An index beyond the recorded size of the structure.
    #[error("index {index} is out of range (size {size})")]
    IndexOutOfRange {
        /// The offending index.
        index: u64,
        /// The size the index was checked against.
        size: u64,
    },

    /// A leaf was required but the index names an interior node.
    #[error("index {0} is not a leaf")]
    NotALeaf(u64),

    /// Children were requested for a leaf.
    #[error("index {0} is not a parent")]
    NotAParent(u64),

    /// Proof data has the wrong shape.
    #[error("malformed proof: {0}")]
    MalformedProof(#[from] ProofError),

    /// A requested leaf or value is absent from the structure.
    #[error("element does not exist in the tree: {0}")]
    LeafNotFound(String),

    /// Hex or other textual decoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error raised while validating construction options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two options that cannot be enabled together.
    #[error("option \"{option}\" is incompatible with \"{conflicting}\"")]
    Incompatible {
        /// The option that was enabled first in the check order.
        option: &'static str,
        /// The option it conflicts with.
        conflicting: &'static str,
    },

    /// An operation that needs an option the tree was built without.
    #[error("{operation} requires option \"{option}\"")]
    Required {
        /// The missing option.
        option: &'static str,
        /// The operation that needs it.
        operation: &'static str,
    },
}

/// Error describing a malformed proof.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// A proof entry could not be interpreted.
    #[error("unexpected proof entry: {0}")]
    UnexpectedEntry(String),

    /// The number of peaks does not match the width.
    #[error("received invalid number of peaks: expected {expected}, got {actual}")]
    PeakCount {
        /// Peaks implied by the width.
        expected: usize,
        /// Peaks supplied.
        actual: usize,
    },

    /// The number of siblings does not match the path to the peak.
    #[error("received invalid number of siblings: expected {expected}, got {actual}")]
    SiblingCount {
        /// Siblings implied by the mountain height.
        expected: usize,
        /// Siblings supplied.
        actual: usize,
    },

    /// Leaf indices and leaf values differ in length.
    #[error("{indices} indices supplied for {leaves} leaves")]
    LeafCount {
        /// Number of indices.
        indices: usize,
        /// Number of leaf values.
        leaves: usize,
    },

    /// No mountain covers the requested index.
    #[error("no peak covers index {0}")]
    TargetNotFound(u64),

    /// A multiproof target set must not be empty.
    #[error("at least one target leaf is required")]
    EmptyTargets,

    /// A node on a target path has no distinct sibling to pair with.
    #[error("node {index} in layer {layer} is not paired")]
    UnpairedNode {
        /// Layer of the node, leaves being layer 0.
        layer: usize,
        /// Index of the node within its layer.
        index: usize,
    },
}

impl AccumError {
    /// Shorthand for an [`AccumError::Encoding`] error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Shorthand for an [`AccumError::LeafNotFound`] error.
    pub fn leaf_not_found(msg: impl Into<String>) -> Self {
        Self::LeafNotFound(msg.into())
    }
}
