//! JSON form of leaves, proofs and whole trees.
//!
//! Byte strings are `0x`-prefixed hex. A tree serializes as
//! `{ "options", "root", "layers", "leaves" }`; only the options and the
//! stored leaves are needed to rebuild it, and the stored root is checked
//! against the rebuilt one.

use accum_core::{AccumError, Hash, Hasher, Result};
use serde::{Deserialize, Serialize};

use crate::options::TreeOptions;
use crate::proof::ProofEntry;
use crate::tree::MerkleTree;

/// Serialized tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarshalledTree {
    pub options: TreeOptions,
    pub root: Hash,
    pub layers: Vec<Vec<Hash>>,
    pub leaves: Vec<Hash>,
}

pub fn marshal_leaves(leaves: &[Hash]) -> Result<String> {
    Ok(serde_json::to_string_pretty(leaves)?)
}

/// Parse a leaf array; `null` is an empty array.
pub fn unmarshal_leaves(json: &str) -> Result<Vec<Hash>> {
    let parsed: Option<Vec<Hash>> = serde_json::from_str(json)?;
    Ok(parsed.unwrap_or_default())
}

pub fn marshal_proof(proof: &[ProofEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(proof)?)
}

/// Parse a proof; each entry may use any of the three entry shapes.
pub fn unmarshal_proof(json: &str) -> Result<Vec<ProofEntry>> {
    let parsed: Option<Vec<ProofEntry>> = serde_json::from_str(json)?;
    Ok(parsed.unwrap_or_default())
}

pub fn marshal_tree<H: Hasher>(tree: &MerkleTree<H>) -> Result<String> {
    let marshalled = MarshalledTree {
        options: tree.options().clone(),
        root: tree.root(),
        layers: tree.layers().to_vec(),
        leaves: tree.leaves().to_vec(),
    };
    Ok(serde_json::to_string_pretty(&marshalled)?)
}

/// Rebuild a tree from its JSON form. The stored leaves are used as they
/// are, without hashing, sorting or padding them again.
pub fn unmarshal_tree<H: Hasher>(json: &str, hasher: H) -> Result<MerkleTree<H>> {
    let marshalled: MarshalledTree = serde_json::from_str(json)?;
    let tree = MerkleTree::from_processed(marshalled.leaves, hasher, marshalled.options)?;
    if tree.root() != marshalled.root {
        return Err(AccumError::encoding(format!(
            "stored root {} does not match rebuilt root {}",
            marshalled.root,
            tree.root()
        )));
    }
    Ok(tree)
}
