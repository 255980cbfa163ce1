//! # Tree Options
//!
//! One immutable configuration value per tree. Options are validated and
//! normalized once, when the tree is constructed, and never change after.
//!
//! The serialized form uses the camelCase names of the JSON tree format
//! (`isBitcoinTree`, `hashLeaves`, `fillDefaultHash`, ...), so a marshalled
//! tree carries its own configuration.

use std::fmt;
use std::sync::Arc;

use accum_core::{ConfigError, Hash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Filler used to pad the leaf sequence up to the next power of two.
#[derive(Clone)]
pub enum DefaultFill {
    /// The same hash at every padded position.
    Constant(Hash),
    /// A hash computed from the padded leaf index.
    PerIndex(Arc<dyn Fn(usize) -> Hash + Send + Sync>),
}

impl DefaultFill {
    /// Wrap a per-index filler function.
    pub fn per_index(f: impl Fn(usize) -> Hash + Send + Sync + 'static) -> Self {
        Self::PerIndex(Arc::new(f))
    }

    /// The filler hash for leaf position `index`.
    pub fn hash_at(&self, index: usize) -> Hash {
        match self {
            Self::Constant(hash) => hash.clone(),
            Self::PerIndex(f) => f(index),
        }
    }
}

impl fmt::Debug for DefaultFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(hash) => f.debug_tuple("Constant").field(hash).finish(),
            Self::PerIndex(_) => f.write_str("PerIndex(<fn>)"),
        }
    }
}

impl From<Hash> for DefaultFill {
    fn from(hash: Hash) -> Self {
        Self::Constant(hash)
    }
}

// A function filler has no textual form and serializes as `null`.
impl Serialize for DefaultFill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Constant(hash) => hash.serialize(serializer),
            Self::PerIndex(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultFill {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Hash::deserialize(deserializer).map(Self::Constant)
    }
}

/// Construction options for a [`MerkleTree`](crate::MerkleTree).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeOptions {
    /// Keep the tree maximally balanced for non-power-of-two leaf counts.
    pub complete: bool,
    /// Byte-reversed double-hash combination with self-paired odd nodes.
    pub is_bitcoin_tree: bool,
    /// Hash raw leaves before building the tree.
    pub hash_leaves: bool,
    /// Sort leaves before building the tree.
    pub sort_leaves: bool,
    /// Sort each sibling pair before combining.
    pub sort_pairs: bool,
    /// Shorthand for `sort_leaves` and `sort_pairs`.
    pub sort: bool,
    /// Pad the leaves to the next power of two.
    pub fill_default_hash: Option<DefaultFill>,
    /// Combine a lone trailing node with itself instead of promoting it.
    pub duplicate_odd: bool,
}

impl TreeOptions {
    /// Set `complete`.
    pub fn complete(mut self, on: bool) -> Self {
        self.complete = on;
        self
    }

    /// Set `isBitcoinTree`.
    pub fn bitcoin(mut self, on: bool) -> Self {
        self.is_bitcoin_tree = on;
        self
    }

    /// Set `hashLeaves`.
    pub fn hash_leaves(mut self, on: bool) -> Self {
        self.hash_leaves = on;
        self
    }

    /// Set `sortLeaves`.
    pub fn sort_leaves(mut self, on: bool) -> Self {
        self.sort_leaves = on;
        self
    }

    /// Set `sortPairs`.
    pub fn sort_pairs(mut self, on: bool) -> Self {
        self.sort_pairs = on;
        self
    }

    /// Set `sort`.
    pub fn sort(mut self, on: bool) -> Self {
        self.sort = on;
        self
    }

    /// Set `duplicateOdd`.
    pub fn duplicate_odd(mut self, on: bool) -> Self {
        self.duplicate_odd = on;
        self
    }

    /// Set the default-hash filler.
    pub fn fill_default_hash(mut self, fill: impl Into<DefaultFill>) -> Self {
        self.fill_default_hash = Some(fill.into());
        self
    }

    /// Check for conflicting options and expand `sort`.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.complete {
            if self.is_bitcoin_tree {
                return Err(ConfigError::Incompatible {
                    option: "complete",
                    conflicting: "isBitcoinTree",
                });
            }
            if self.duplicate_odd {
                return Err(ConfigError::Incompatible {
                    option: "complete",
                    conflicting: "duplicateOdd",
                });
            }
        }
        if self.sort {
            self.sort_leaves = true;
            self.sort_pairs = true;
        }
        Ok(self)
    }

    /// True when a lone trailing node is paired with itself.
    pub fn pairs_odd_with_self(&self) -> bool {
        self.is_bitcoin_tree || self.duplicate_odd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_rejects_bitcoin() {
        let err = TreeOptions::default()
            .complete(true)
            .bitcoin(true)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "option \"complete\" is incompatible with \"isBitcoinTree\""
        );
    }

    #[test]
    fn test_complete_rejects_duplicate_odd() {
        let err = TreeOptions::default()
            .complete(true)
            .duplicate_odd(true)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Incompatible {
                conflicting: "duplicateOdd",
                ..
            }
        ));
    }

    #[test]
    fn test_sort_expands() {
        let opts = TreeOptions::default().sort(true).validate().unwrap();
        assert!(opts.sort_leaves);
        assert!(opts.sort_pairs);
    }

    #[test]
    fn test_serde_camel_case() {
        let opts = TreeOptions::default()
            .bitcoin(true)
            .fill_default_hash(Hash::from_bytes(vec![0xaa]));
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["isBitcoinTree"], true);
        assert_eq!(json["fillDefaultHash"], "0xaa");
        assert_eq!(json["duplicateOdd"], false);

        let back: TreeOptions = serde_json::from_value(json).unwrap();
        assert!(back.is_bitcoin_tree);
        assert_eq!(
            back.fill_default_hash.map(|f| f.hash_at(3)),
            Some(Hash::from_bytes(vec![0xaa]))
        );
    }

    #[test]
    fn test_function_filler_serializes_as_null() {
        let opts = TreeOptions::default()
            .fill_default_hash(DefaultFill::per_index(|i| Hash::from_bytes(vec![i as u8])));
        let json = serde_json::to_value(&opts).unwrap();
        assert!(json["fillDefaultHash"].is_null());
    }

    #[test]
    fn test_missing_fields_default() {
        let opts: TreeOptions = serde_json::from_str(r#"{"sortPairs": true}"#).unwrap();
        assert!(opts.sort_pairs);
        assert!(!opts.complete);
        assert!(opts.fill_default_hash.is_none());
    }
}
