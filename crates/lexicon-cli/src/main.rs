//! Lexicon CLI
//!
//! - `batch`: turn a folder of PDF/EPUB documents into per-document `.vocab.json` files
//! - `consolidate`: merge per-document vocabularies into a master vocabulary
//! - `flag`: apply IP flagging to a vocabulary file
//! - `review`: export flagged entries for human review
//! - `orphans`: list (or clean up) outputs whose source document is gone

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use lexicon_vocab::Blocklist;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod batch;
mod consolidate;
mod orphans;
mod review;

/// Blocklist used when `--blocklist` is not given and this file exists.
pub(crate) const DEFAULT_BLOCKLIST: &str = "data/ip-blocklist.json";

pub(crate) const EXIT_OK: u8 = 0;

#[derive(Parser)]
#[command(name = "lexicon")]
#[command(author, version, about = "Lexicon: fantasy vocabulary extraction and consolidation")]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF/EPUB in a folder in parallel, resuming interrupted runs.
    Batch(batch::BatchArgs),

    /// Merge `*.vocab.json` files in a directory into a master vocabulary.
    Consolidate(consolidate::ConsolidateArgs),

    /// Apply IP flagging to a vocabulary file in place.
    Flag(review::FlagArgs),

    /// Write `flagged.json` for the flagged entries of a vocabulary file.
    Review(review::ReviewArgs),

    /// List outputs whose source documents no longer exist.
    Orphans(orphans::OrphansArgs),
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default = if quiet {
        LevelFilter::WARN
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Load the blocklist to use, if any.
///
/// An explicit path that does not exist is a warning, not an error. Without
/// an explicit path, [`DEFAULT_BLOCKLIST`] is used when present.
pub(crate) fn resolve_blocklist(explicit: Option<&Path>) -> Result<Option<Blocklist>> {
    let path = match explicit {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => {
            eprintln!(
                "{} blocklist not found: {}",
                "warning:".yellow().bold(),
                path.display()
            );
            return Ok(None);
        }
        None => {
            let default = PathBuf::from(DEFAULT_BLOCKLIST);
            if !default.exists() {
                return Ok(None);
            }
            default
        }
    };
    let blocklist = Blocklist::load(&path)?;
    eprintln!("{} {}", "Using blocklist".cyan(), path.display());
    Ok(Some(blocklist))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let code = match cli.command {
        Commands::Batch(args) => batch::cmd_batch(args, cli.quiet)?,
        Commands::Consolidate(args) => consolidate::cmd_consolidate(args)?,
        Commands::Flag(args) => review::cmd_flag(args)?,
        Commands::Review(args) => review::cmd_review(args)?,
        Commands::Orphans(args) => orphans::cmd_orphans(args)?,
    };
    Ok(ExitCode::from(code))
}
