//! `lexicon orphans`

use crate::EXIT_OK;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use lexicon_batch::{discover, BatchConfig};
use lexicon_vocab::Manifest;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct OrphansArgs {
    /// Directory the batch run read documents from
    input_dir: PathBuf,

    /// Batch output directory (default: <input_dir>/output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Delete orphaned vocabulary files and forget them in the manifest
    #[arg(long)]
    remove: bool,
}

pub fn cmd_orphans(args: OrphansArgs) -> Result<u8> {
    let output_dir = args
        .output
        .unwrap_or_else(|| args.input_dir.join("output"));
    let manifest_path = BatchConfig::new(&args.input_dir, &output_dir).manifest_path();
    let mut manifest = Manifest::load(&manifest_path)?;

    let current = discover(&args.input_dir)?;
    let orphans = manifest.orphaned_sources(&current);
    if orphans.is_empty() {
        eprintln!("{}", "No orphaned outputs.".green());
        return Ok(EXIT_OK);
    }

    for output in manifest.orphaned_outputs(&current) {
        println!("{}", output.display());
    }
    eprintln!(
        "{}",
        format!("{} orphaned output(s)", orphans.len()).yellow()
    );

    if args.remove {
        for source in &orphans {
            let Some(entry) = manifest.remove_entry(source) else {
                continue;
            };
            let output = PathBuf::from(&entry.output_path);
            if output.exists() {
                fs::remove_file(&output)
                    .with_context(|| format!("cannot remove {}", output.display()))?;
            }
            tracing::info!(source = %source, output = %output.display(), "removed orphan");
        }
        manifest.save(&manifest_path)?;
        eprintln!("{}", "Removed.".green());
    }
    Ok(EXIT_OK)
}
