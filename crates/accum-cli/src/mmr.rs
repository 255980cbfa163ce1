//! # MMR Subcommand
//!
//! ```bash
//! accum mmr root --leaf 01 02 03
//! accum mmr proof --leaf 01 02 03 --index 2
//! accum mmr verify --proof proof.json --index 2 --leaf 02
//! accum mmr roll-up --root 0x... --width 3 --peak 0x... --peak 0x... --item 04
//! ```
//!
//! Indices are 1-based node positions. Roll-up items are leaf values; they
//! are hashed before the peak update, as `append` would.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;

use accum_core::{Hash, Hasher, ToCanonicalBytes};
use accum_mmr::{Mmr, MmrProof, MountainFns};

use crate::config::Algorithm;
use crate::{LeafArgs, Report};

/// MMR subcommand arguments.
#[derive(Args, Debug)]
pub struct MmrArgs {
    #[command(subcommand)]
    pub command: MmrCommand,
}

/// Available MMR subcommands.
#[derive(Subcommand, Debug)]
pub enum MmrCommand {
    /// Print the root, width, size and peaks.
    Root {
        #[command(flatten)]
        input: LeafArgs,
    },

    /// Print the inclusion proof for the leaf at a position.
    Proof {
        #[command(flatten)]
        input: LeafArgs,
        /// 1-based leaf position.
        #[arg(long)]
        index: u64,
    },

    /// Verify a proof file for a leaf value.
    Verify {
        /// JSON proof, as printed by `mmr proof`.
        #[arg(long)]
        proof: PathBuf,
        /// 1-based leaf position.
        #[arg(long)]
        index: u64,
        /// Leaf value (hex).
        #[arg(long)]
        leaf: String,
    },

    /// Compute the root after appending items to a peak summary.
    RollUp {
        /// Current root (hex).
        #[arg(long)]
        root: String,
        /// Current number of leaves.
        #[arg(long)]
        width: u64,
        /// Peak hash, leftmost first. Repeatable.
        #[arg(long = "peak", value_name = "HEX")]
        peaks: Vec<String>,
        /// Leaf value to append. Repeatable.
        #[arg(long = "item", value_name = "HEX")]
        items: Vec<String>,
    },
}

type CliMmr = Mmr<MountainFns<Box<dyn Hasher>>>;

fn empty(algorithm: Algorithm) -> CliMmr {
    Mmr::new(MountainFns::new(algorithm.hasher()))
}

fn parse_hashes(values: &[String], what: &str) -> Result<Vec<Hash>> {
    values
        .iter()
        .map(|v| Hash::from_hex(v).with_context(|| format!("invalid {what}: {v}")))
        .collect()
}

/// Execute the MMR subcommand.
pub fn run_mmr(args: &MmrArgs, algorithm: Algorithm) -> Result<u8> {
    execute(&args.command, algorithm).map(Report::emit)
}

/// Run an MMR subcommand and return its report.
pub fn execute(command: &MmrCommand, algorithm: Algorithm) -> Result<Report> {
    match command {
        MmrCommand::Root { input } => {
            let mmr = Mmr::from_leaves(input.leaves.iter(), MountainFns::new(algorithm.hasher()))?;
            let peaks: Vec<String> = mmr.peaks().iter().map(Hash::to_hex).collect();
            Report::json(
                &json!({
                    "root": mmr.hex_root(),
                    "width": mmr.width(),
                    "size": mmr.size(),
                    "peaks": peaks,
                }),
                true,
            )
        }
        MmrCommand::Proof { input, index } => {
            let mmr = Mmr::from_leaves(input.leaves.iter(), MountainFns::new(algorithm.hasher()))?;
            let proof = mmr.merkle_proof(*index)?;
            Report::json(&proof, true)
        }
        MmrCommand::Verify { proof, index, leaf } => {
            let text = std::fs::read_to_string(proof)
                .with_context(|| format!("failed to read proof: {}", proof.display()))?;
            let parsed: MmrProof = serde_json::from_str(&text)
                .with_context(|| format!("invalid proof file: {}", proof.display()))?;
            let valid = empty(algorithm).verify_proof(&parsed, *index, leaf.as_str())?;
            tracing::info!(valid, index, width = parsed.width, "verified MMR proof");
            Report::json(&json!({ "valid": valid }), valid)
        }
        MmrCommand::RollUp {
            root,
            width,
            peaks,
            items,
        } => {
            let mmr = empty(algorithm);
            let root = Hash::from_hex(root).context("invalid --root")?;
            let peaks = parse_hashes(peaks, "--peak")?;
            let item_hashes: Vec<Hash> = items
                .iter()
                .map(|item| mmr.hasher().hash(item.to_canonical_bytes().as_bytes()))
                .collect();
            let rolled = mmr.roll_up(&root, *width, &peaks, &item_hashes)?;
            if rolled.is_none() {
                tracing::warn!(width, "root does not bag from the supplied peaks");
            }
            Report::json(
                &json!({
                    "root": rolled.as_ref().map(Hash::to_hex),
                    "width": width + items.len() as u64,
                }),
                rolled.is_some(),
            )
        }
    }
}
