//! Command line front end for header and Merkle proof verification.
//!
//! Reads already-fetched node responses as JSON (from a file or stdin) and
//! prints JSON reports on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;

/// Verify block header hashes and Merkle inclusion proofs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Also write the JSON report to this file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify headers: input is {"header": <getblockheader>, "raw_block": <hex>},
    /// or an array of those (optionally with "height") to audit several blocks
    Header {
        /// Input JSON file, or - for stdin
        input: PathBuf,

        /// Exit with an error when the computed hash differs from the claim
        #[arg(long)]
        strict: bool,
    },

    /// Build an inclusion proof: input is a getblock (verbosity 1) response
    Proof {
        /// Input JSON file, or - for stdin
        input: PathBuf,

        /// Transaction id to prove (display form)
        txid: String,
    },

    /// Check a published proof: {"tx_id", "merkle_root" or "block_hash", "merkle_branch", "merkle_index"}
    CheckProof {
        /// Input JSON file, or - for stdin
        input: PathBuf,

        /// Merkle root to check against (display form); required when the
        /// proof only names its block
        #[arg(long)]
        root: Option<String>,
    },

    /// Print the verification id for a block hash
    Vid {
        /// Block hash (display form)
        hash: String,
    },
}

/// Initializes tracing on stderr with the requested level.
fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    let result = match &args.command {
        Command::Header { input, strict } => commands::header(input, *strict),
        Command::Proof { input, txid } => commands::proof(input, txid),
        Command::CheckProof { input, root } => commands::check_proof(input, root.as_deref()),
        Command::Vid { hash } => commands::verification_id(hash),
    };

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            error!("{:#}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = commands::emit(&report, args.output.as_deref()) {
        error!("{:#}", err);
        return ExitCode::FAILURE;
    }
    if let Some(path) = &args.output {
        info!(path = %path.display(), "saved report");
    }

    if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
