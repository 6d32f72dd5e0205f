//! `lexicon consolidate`

use crate::{resolve_blocklist, EXIT_OK};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use lexicon_batch::{EXIT_NO_INPUT, VOCAB_SUFFIX};
use lexicon_vocab::{
    consolidate, Manifest, ReviewQueue, VocabularyOutput, MASTER_FILE_NAME, REVIEW_FILE_NAME,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Tracks which vocabulary files went into the master. Kept apart from the
/// batch manifest, which tracks source documents.
pub const CONSOLIDATION_MANIFEST: &str = ".lexicon-consolidation.json";

#[derive(Args)]
pub struct ConsolidateArgs {
    /// Directory containing .vocab.json files
    vocab_dir: PathBuf,

    /// Master vocabulary path (default: <vocab_dir>/master.vocab.json)
    #[arg(short, long)]
    master: Option<PathBuf>,

    /// IP blocklist JSON (default: data/ip-blocklist.json if present)
    #[arg(short, long)]
    blocklist: Option<PathBuf>,

    /// Rebuild even if no vocabulary file changed
    #[arg(short, long)]
    force: bool,

    /// Drop manifest records of vocabulary files that no longer exist
    #[arg(long)]
    remove_orphans: bool,
}

/// `*.vocab.json` directly inside `dir`, excluding any master file, sorted.
pub fn vocab_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("cannot read {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && name.ends_with(VOCAB_SUFFIX) && name != MASTER_FILE_NAME
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn cmd_consolidate(args: ConsolidateArgs) -> Result<u8> {
    let files = vocab_files(&args.vocab_dir)?;
    if files.is_empty() {
        eprintln!(
            "{}",
            format!("No .vocab.json files found in {}", args.vocab_dir.display()).yellow()
        );
        return Ok(EXIT_NO_INPUT as u8);
    }
    tracing::debug!(files = files.len(), "found vocabulary files");

    let manifest_path = args.vocab_dir.join(CONSOLIDATION_MANIFEST);
    let mut manifest = Manifest::load(&manifest_path)?;

    let changed: Vec<&PathBuf> = files
        .iter()
        .filter(|f| manifest.needs_processing(f))
        .collect();
    let orphans = manifest.orphaned_sources(&files);

    if changed.is_empty() && !args.force && !args.remove_orphans && orphans.is_empty() {
        eprintln!(
            "{}",
            "No changes detected. Use --force to rebuild.".green()
        );
        return Ok(EXIT_OK);
    }
    if !changed.is_empty() {
        eprintln!("{}", format!("Processing {} changed file(s)", changed.len()).cyan());
    }

    if !orphans.is_empty() {
        eprintln!(
            "{}",
            format!("Found {} orphaned vocabulary file(s)", orphans.len()).yellow()
        );
        for orphan in &orphans {
            eprintln!("  - {orphan}");
        }
        if args.remove_orphans {
            for orphan in &orphans {
                manifest.remove_entry(orphan);
            }
        }
    }

    let master_path = args
        .master
        .clone()
        .unwrap_or_else(|| args.vocab_dir.join(MASTER_FILE_NAME));
    let blocklist = resolve_blocklist(args.blocklist.as_deref())?;

    let summary = consolidate(&files, &master_path, blocklist.as_ref())?;

    for file in &files {
        let output = VocabularyOutput::read_from(file)?;
        manifest.update_entry(file, &master_path, output.entries.len())?;
    }
    manifest.save(&manifest_path)?;

    eprintln!("{} {}", "Consolidated:".green(), master_path.display());
    eprintln!("  Change summary: {summary}");

    if !summary.flagged.is_empty() {
        let master = VocabularyOutput::read_from(&master_path)?;
        let queue = ReviewQueue::from_output(&master);
        let review_path = master_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(REVIEW_FILE_NAME);
        queue.write_to(&review_path)?;
        eprintln!(
            "{} {} ({} terms)",
            "Review queue:".yellow(),
            review_path.display(),
            queue.total_flagged
        );
    }
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn vocab_files_skip_master_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.vocab.json", "a.vocab.json", MASTER_FILE_NAME, "notes.json"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::write(dir.path().join(CONSOLIDATION_MANIFEST), "{}").unwrap();

        let files = vocab_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.vocab.json"), dir.path().join("b.vocab.json")]
        );
    }
}
