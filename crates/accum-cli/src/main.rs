//! # accum CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use accum_cli::config::{load_options, Algorithm};
use accum_cli::mmr::{run_mmr, MmrArgs};
use accum_cli::tree::{run_tree, TreeArgs};

/// Merkle tree and Merkle Mountain Range toolkit.
///
/// Builds accumulators from hex leaves and prints roots, proofs and
/// verification results as JSON.
#[derive(Parser, Debug)]
#[command(name = "accum", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Tree options file (YAML, or JSON with a `.json` extension).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hash function for every node.
    #[arg(long, value_enum, global = true, default_value_t = Algorithm::Sha256)]
    algorithm: Algorithm,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Binary Merkle tree roots, proofs and multiproofs.
    Tree(TreeArgs),

    /// Merkle Mountain Range roots, proofs and roll-ups.
    Mmr(MmrArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("accum CLI starting");

    let result = match &cli.command {
        Commands::Tree(args) => load_options(cli.config.as_deref())
            .and_then(|options| run_tree(args, options, cli.algorithm)),
        Commands::Mmr(args) => run_mmr(args, cli.algorithm),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accum_cli::mmr::MmrCommand;
    use accum_cli::tree::TreeCommand;

    #[test]
    fn cli_parse_tree_root() {
        let cli = Cli::try_parse_from(["accum", "tree", "root", "--leaf", "01", "02", "--hash-leaves"]).unwrap();
        let Commands::Tree(args) = cli.command else {
            panic!("expected tree command");
        };
        let TreeCommand::Root { input, flags } = args.command else {
            panic!("expected root");
        };
        assert_eq!(input.leaves, vec!["01", "02"]);
        assert!(flags.hash_leaves);
        assert!(!flags.sort);
    }

    #[test]
    fn cli_parse_repeated_leaf_flags() {
        let cli = Cli::try_parse_from([
            "accum", "tree", "proof", "--leaf", "01", "--leaf", "02", "--index", "1", "--positional",
        ])
        .unwrap();
        let Commands::Tree(args) = cli.command else {
            panic!("expected tree command");
        };
        let TreeCommand::Proof {
            input,
            index,
            positional,
            ..
        } = args.command
        else {
            panic!("expected proof");
        };
        assert_eq!(input.leaves.len(), 2);
        assert_eq!(index, 1);
        assert!(positional);
    }

    #[test]
    fn cli_parse_multiproof_indices() {
        let cli = Cli::try_parse_from([
            "accum", "tree", "multiproof", "--leaf", "01", "02", "03", "--index", "0", "--index", "2",
        ])
        .unwrap();
        let Commands::Tree(args) = cli.command else {
            panic!("expected tree command");
        };
        assert!(matches!(
            args.command,
            TreeCommand::Multiproof { ref indices, .. } if indices == &vec![0, 2]
        ));
    }

    #[test]
    fn cli_parse_mmr_roll_up() {
        let cli = Cli::try_parse_from([
            "accum", "mmr", "roll-up", "--root", "0x01", "--width", "3", "--peak", "0x02", "--peak",
            "0x03", "--item", "04",
        ])
        .unwrap();
        let Commands::Mmr(args) = cli.command else {
            panic!("expected mmr command");
        };
        let MmrCommand::RollUp {
            width, peaks, items, ..
        } = args.command
        else {
            panic!("expected roll-up");
        };
        assert_eq!(width, 3);
        assert_eq!(peaks.len(), 2);
        assert_eq!(items, vec!["04"]);
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli0 = Cli::try_parse_from(["accum", "mmr", "root", "--leaf", "01"]).unwrap();
        assert_eq!(cli0.verbose, 0);

        let cli3 = Cli::try_parse_from(["accum", "-vvv", "mmr", "root", "--leaf", "01"]).unwrap();
        assert_eq!(cli3.verbose, 3);
    }

    #[test]
    fn cli_parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "accum", "tree", "root", "--leaf", "01", "--algorithm", "sha512", "--config", "opts.yaml",
        ])
        .unwrap();
        assert_eq!(cli.algorithm, Algorithm::Sha512);
        assert_eq!(cli.config, Some(PathBuf::from("opts.yaml")));
    }

    #[test]
    fn cli_parse_requires_leaves() {
        assert!(Cli::try_parse_from(["accum", "tree", "root"]).is_err());
        assert!(Cli::try_parse_from(["accum"]).is_err());
        assert!(Cli::try_parse_from(["accum", "tree", "root", "--leaf", "01", "--algorithm", "md5"]).is_err());
    }
}
