//! # accum-cli — Accumulator Command-Line Interface
//!
//! Builds binary Merkle trees and Merkle Mountain Ranges from hex leaves
//! given on the command line and prints roots, proofs and verification
//! results as JSON.
//!
//! ## Subcommands
//!
//! - `tree`: root, single proof, multiproof, verify, show
//! - `mmr`: root, proof, verify, roll-up
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers, which return a
//!   [`Report`] so they can be tested without capturing stdout.
//! - Handlers delegate to `accum-tree` and `accum-mmr`; no accumulator logic
//!   lives here.
//! - Exit code 0 means success (or a valid proof); 1 means an error or an
//!   invalid proof.

pub mod config;
pub mod mmr;
pub mod tree;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

/// Leaves supplied on the command line.
#[derive(Args, Debug, Clone)]
pub struct LeafArgs {
    /// Leaf value, hex with or without `0x`. Repeatable.
    #[arg(long = "leaf", value_name = "HEX", required = true, num_args = 1..)]
    pub leaves: Vec<String>,
}

/// The output of a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Text printed to stdout.
    pub body: String,
    /// False when a proof or roll-up failed to verify.
    pub success: bool,
}

impl Report {
    /// Pretty JSON body.
    pub fn json(value: &impl Serialize, success: bool) -> Result<Self> {
        Ok(Self {
            body: serde_json::to_string_pretty(value)?,
            success,
        })
    }

    /// Print the body and return the process exit code.
    pub fn emit(self) -> u8 {
        println!("{}", self.body);
        if self.success {
            0
        } else {
            1
        }
    }
}
