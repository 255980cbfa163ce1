//! # Tree Configuration
//!
//! A tree's [`TreeOptions`] come from an optional config file (YAML, or
//! JSON when the file name ends in `.json`) using the camelCase option names
//! of the JSON tree format. Command-line flags are applied on top and can
//! only switch options on.
//!
//! ```yaml
//! hashLeaves: true
//! sortPairs: true
//! fillDefaultHash: "0x00"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use accum_core::{Hash, Hasher, Sha256Hasher, Sha512Hasher};
use accum_tree::{DefaultFill, TreeOptions};

/// Hash function used for every node.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn hasher(self) -> Box<dyn Hasher> {
        match self {
            Self::Sha256 => Box::new(Sha256Hasher::new()),
            Self::Sha512 => Box::new(Sha512Hasher::new()),
        }
    }
}

/// Option flags accepted by every `tree` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct TreeFlags {
    /// Hash the leaves before building.
    #[arg(long)]
    pub hash_leaves: bool,

    /// Sort the leaves before building.
    #[arg(long)]
    pub sort_leaves: bool,

    /// Sort each pair before hashing.
    #[arg(long)]
    pub sort_pairs: bool,

    /// Sort leaves and pairs.
    #[arg(long)]
    pub sort: bool,

    /// Hash a lone trailing node with itself.
    #[arg(long)]
    pub duplicate_odd: bool,

    /// Bitcoin block-hash convention.
    #[arg(long)]
    pub bitcoin: bool,

    /// Keep the tree balanced for any leaf count.
    #[arg(long)]
    pub complete: bool,

    /// Pad the leaves to a power of two with this hash.
    #[arg(long, value_name = "HEX")]
    pub fill_default: Option<String>,
}

impl TreeFlags {
    /// `base` with every set flag switched on.
    pub fn apply(&self, base: TreeOptions) -> Result<TreeOptions> {
        let mut options = base;
        options.hash_leaves |= self.hash_leaves;
        options.sort_leaves |= self.sort_leaves;
        options.sort_pairs |= self.sort_pairs;
        options.sort |= self.sort;
        options.duplicate_odd |= self.duplicate_odd;
        options.is_bitcoin_tree |= self.bitcoin;
        options.complete |= self.complete;
        if let Some(hex) = &self.fill_default {
            let fill = Hash::from_hex(hex).context("invalid --fill-default")?;
            options.fill_default_hash = Some(DefaultFill::Constant(fill));
        }
        Ok(options)
    }
}

/// Load tree options from `path`, or the defaults when no file is given.
pub fn load_options(path: Option<&Path>) -> Result<TreeOptions> {
    let Some(path) = path else {
        return Ok(TreeOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let options = if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON config: {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML config: {}", path.display()))?
    };
    tracing::debug!(config = %path.display(), ?options, "loaded tree options");
    Ok(options)
}
