//! # Tree Subcommand
//!
//! ```bash
//! accum tree root --leaf 01 --leaf 02 --leaf 03 --hash-leaves
//! accum tree proof --leaf 01 02 03 04 --index 2 --positional
//! accum tree multiproof --leaf 01 02 03 04 --index 0 --index 3
//! accum tree verify --proof proof.json --leaf 0x03 --root 0x...
//! accum tree show --leaf 01 02 03
//! ```
//!
//! Proofs are printed for the stored leaf, which is the hashed value when
//! `--hash-leaves` is set; `verify` expects that same stored value.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;

use accum_core::{Hash, Hasher};
use accum_tree::{verify_proof, MerkleTree, ProofEntry, TreeOptions};

use crate::config::{Algorithm, TreeFlags};
use crate::{LeafArgs, Report};

/// Tree subcommand arguments.
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(subcommand)]
    pub command: TreeCommand,
}

/// Available tree subcommands.
#[derive(Subcommand, Debug)]
pub enum TreeCommand {
    /// Print the root, leaf count and depth.
    Root {
        #[command(flatten)]
        input: LeafArgs,
        #[command(flatten)]
        flags: TreeFlags,
    },

    /// Print the proof for one leaf.
    Proof {
        #[command(flatten)]
        input: LeafArgs,
        /// Zero-based leaf index.
        #[arg(long)]
        index: usize,
        /// Emit `[side, hex]` pairs (0 = left).
        #[arg(long)]
        positional: bool,
        #[command(flatten)]
        flags: TreeFlags,
    },

    /// Print the multiproof for several leaves.
    Multiproof {
        #[command(flatten)]
        input: LeafArgs,
        /// Zero-based leaf index. Repeatable.
        #[arg(long = "index", required = true)]
        indices: Vec<usize>,
        #[command(flatten)]
        flags: TreeFlags,
    },

    /// Verify a proof file against a leaf and root.
    Verify {
        /// JSON report printed by `tree proof`, or its bare proof array.
        #[arg(long)]
        proof: PathBuf,
        /// Stored leaf value (hex).
        #[arg(long)]
        leaf: String,
        /// Expected root (hex).
        #[arg(long)]
        root: String,
        #[command(flatten)]
        flags: TreeFlags,
    },

    /// Draw the tree.
    Show {
        #[command(flatten)]
        input: LeafArgs,
        #[command(flatten)]
        flags: TreeFlags,
    },
}

/// Execute the tree subcommand.
pub fn run_tree(args: &TreeArgs, base: TreeOptions, algorithm: Algorithm) -> Result<u8> {
    execute(&args.command, base, algorithm).map(Report::emit)
}

/// Run a tree subcommand and return its report.
pub fn execute(command: &TreeCommand, base: TreeOptions, algorithm: Algorithm) -> Result<Report> {
    match command {
        TreeCommand::Root { input, flags } => {
            let tree = build(&input.leaves, flags.apply(base)?, algorithm)?;
            Report::json(
                &json!({
                    "root": tree.hex_root(),
                    "leafCount": tree.leaf_count(),
                    "depth": tree.depth(),
                }),
                true,
            )
        }
        TreeCommand::Proof {
            input,
            index,
            positional,
            flags,
        } => {
            let tree = build(&input.leaves, flags.apply(base)?, algorithm)?;
            let index = *index;
            anyhow::ensure!(
                index < tree.leaf_count(),
                "leaf index {index} out of range ({} leaves)",
                tree.leaf_count()
            );
            let leaf = tree.leaf(index);
            let proof = if *positional {
                serde_json::to_value(tree.positional_hex_proof(&leaf, Some(index)))?
            } else {
                serde_json::to_value(tree.proof_at(index))?
            };
            Report::json(
                &json!({
                    "root": tree.hex_root(),
                    "index": index,
                    "leaf": leaf.to_hex(),
                    "proof": proof,
                }),
                true,
            )
        }
        TreeCommand::Multiproof {
            input,
            indices,
            flags,
        } => {
            let tree = build(&input.leaves, flags.apply(base)?, algorithm)?;
            let proof = tree.hex_multi_proof(indices)?;
            let leaves: Vec<String> = indices.iter().map(|&i| tree.leaf(i).to_hex()).collect();
            Report::json(
                &json!({
                    "root": tree.hex_root(),
                    "leafCount": tree.leaf_count(),
                    "indices": indices,
                    "leaves": leaves,
                    "proof": proof,
                }),
                true,
            )
        }
        TreeCommand::Verify {
            proof,
            leaf,
            root,
            flags,
        } => {
            let entries = read_proof(proof)?;
            let root = Hash::from_hex(root).context("invalid --root")?;
            let valid = verify_proof(
                &entries,
                leaf.as_str(),
                &root,
                algorithm.hasher(),
                flags.apply(base)?,
            )?;
            tracing::info!(valid, entries = entries.len(), "verified tree proof");
            Report::json(&json!({ "valid": valid }), valid)
        }
        TreeCommand::Show { input, flags } => {
            let tree = build(&input.leaves, flags.apply(base)?, algorithm)?;
            Ok(Report {
                body: tree.render().trim_end().to_string(),
                success: true,
            })
        }
    }
}

/// Proof entries from a `tree proof` report or a bare proof array.
fn read_proof(path: &Path) -> Result<Vec<ProofEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read proof: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid proof file: {}", path.display()))?;
    let entries = match value {
        serde_json::Value::Object(mut report) => report
            .remove("proof")
            .with_context(|| format!("no `proof` field in {}", path.display()))?,
        array => array,
    };
    serde_json::from_value::<Option<Vec<ProofEntry>>>(entries)
        .map(Option::unwrap_or_default)
        .with_context(|| format!("invalid proof entries in {}", path.display()))
}

fn build(
    leaves: &[String],
    options: TreeOptions,
    algorithm: Algorithm,
) -> Result<MerkleTree<Box<dyn Hasher>>> {
    let tree = MerkleTree::new(leaves.iter(), algorithm.hasher(), options)?;
    tracing::debug!(leaves = tree.leaf_count(), root = %tree.hex_root(), "built tree");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn input(leaves: &[&str]) -> LeafArgs {
        LeafArgs {
            leaves: leaves.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn body(report: &Report) -> serde_json::Value {
        serde_json::from_str(&report.body).unwrap()
    }

    #[test]
    fn root_report() {
        let command = TreeCommand::Root {
            input: input(&["01", "02", "03", "04"]),
            flags: TreeFlags::default(),
        };
        let report = execute(&command, TreeOptions::default(), Algorithm::Sha256).unwrap();
        assert!(report.success);
        let value = body(&report);
        assert_eq!(value["leafCount"], 4);
        assert_eq!(value["depth"], 2);
        assert_eq!(value["root"].as_str().map(str::len), Some(66));
    }

    #[test]
    fn proof_then_verify_through_file() {
        let command = TreeCommand::Proof {
            input: input(&["a1", "b2", "c3"]),
            index: 1,
            positional: false,
            flags: TreeFlags {
                hash_leaves: true,
                ..TreeFlags::default()
            },
        };
        let report = execute(&command, TreeOptions::default(), Algorithm::Sha256).unwrap();
        let value = body(&report);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(report.body.as_bytes()).unwrap();

        let verify = TreeCommand::Verify {
            proof: file.path().to_path_buf(),
            leaf: value["leaf"].as_str().unwrap().to_string(),
            root: value["root"].as_str().unwrap().to_string(),
            flags: TreeFlags::default(),
        };
        let report = execute(&verify, TreeOptions::default(), Algorithm::Sha256).unwrap();
        assert!(report.success);

        let tampered = TreeCommand::Verify {
            proof: file.path().to_path_buf(),
            leaf: "0x00".into(),
            root: value["root"].as_str().unwrap().to_string(),
            flags: TreeFlags::default(),
        };
        let report = execute(&tampered, TreeOptions::default(), Algorithm::Sha256).unwrap();
        assert!(!report.success);
        assert_eq!(body(&report)["valid"], false);
    }

    #[test]
    fn verify_accepts_bare_positional_array() {
        let command = TreeCommand::Proof {
            input: input(&["01", "02", "03", "04"]),
            index: 3,
            positional: true,
            flags: TreeFlags::default(),
        };
        let value = body(&execute(&command, TreeOptions::default(), Algorithm::Sha256).unwrap());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(value["proof"].to_string().as_bytes()).unwrap();

        let verify = TreeCommand::Verify {
            proof: file.path().to_path_buf(),
            leaf: value["leaf"].as_str().unwrap().to_string(),
            root: value["root"].as_str().unwrap().to_string(),
            flags: TreeFlags::default(),
        };
        assert!(execute(&verify, TreeOptions::default(), Algorithm::Sha256).unwrap().success);
    }

    #[test]
    fn verify_rejects_report_without_proof() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"root": "0x01"}"#).unwrap();
        let verify = TreeCommand::Verify {
            proof: file.path().to_path_buf(),
            leaf: "01".into(),
            root: "0x01".into(),
            flags: TreeFlags::default(),
        };
        assert!(execute(&verify, TreeOptions::default(), Algorithm::Sha256).is_err());
    }

    #[test]
    fn positional_proof_shape() {
        let command = TreeCommand::Proof {
            input: input(&["01", "02", "03", "04"]),
            index: 0,
            positional: true,
            flags: TreeFlags::default(),
        };
        let value = body(&execute(&command, TreeOptions::default(), Algorithm::Sha256).unwrap());
        assert_eq!(value["proof"][0][0], 1);
        assert_eq!(value["proof"][0][1], "0x02");
    }

    #[test]
    fn proof_index_out_of_range() {
        let command = TreeCommand::Proof {
            input: input(&["01"]),
            index: 3,
            positional: false,
            flags: TreeFlags::default(),
        };
        assert!(execute(&command, TreeOptions::default(), Algorithm::Sha256).is_err());
    }

    #[test]
    fn multiproof_report() {
        let command = TreeCommand::Multiproof {
            input: input(&["01", "02", "03", "04"]),
            indices: vec![0, 3],
            flags: TreeFlags::default(),
        };
        let value = body(&execute(&command, TreeOptions::default(), Algorithm::Sha256).unwrap());
        assert_eq!(value["leaves"][0], "0x01");
        assert_eq!(value["proof"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn conflicting_options_fail() {
        let command = TreeCommand::Root {
            input: input(&["01", "02"]),
            flags: TreeFlags {
                complete: true,
                bitcoin: true,
                ..TreeFlags::default()
            },
        };
        assert!(execute(&command, TreeOptions::default(), Algorithm::Sha256).is_err());
    }

    #[test]
    fn show_draws_tree() {
        let command = TreeCommand::Show {
            input: input(&["01", "02"]),
            flags: TreeFlags::default(),
        };
        let report = execute(&command, TreeOptions::default(), Algorithm::Sha256).unwrap();
        assert_eq!(report.body.lines().count(), 3);
        assert!(report.body.starts_with("└─ "));
    }
}
