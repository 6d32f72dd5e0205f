//! `lexicon flag` and `lexicon review`

use crate::{resolve_blocklist, EXIT_OK};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use lexicon_vocab::{
    backup_and_write, flag_terms, ReviewQueue, VocabularyOutput, REVIEW_FILE_NAME,
};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct FlagArgs {
    /// Vocabulary file to flag
    vocab_file: PathBuf,

    /// Write here instead of replacing the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// IP blocklist JSON (default: data/ip-blocklist.json if present)
    #[arg(short, long)]
    blocklist: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReviewArgs {
    /// Vocabulary file to export flagged entries from
    vocab_file: PathBuf,

    /// Review file path (default: flagged.json beside the vocabulary)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn review_path_beside(vocab: &Path) -> PathBuf {
    vocab
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(REVIEW_FILE_NAME)
}

/// Re-run the detector over every entry and rewrite the file.
pub fn flag_file(
    input: &Path,
    output: &Path,
    blocklist: Option<&lexicon_vocab::Blocklist>,
) -> Result<VocabularyOutput> {
    let vocab = VocabularyOutput::read_from(input)?;
    let entries = flag_terms(&vocab.entries, blocklist);
    let flagged = VocabularyOutput::from_entries(
        vocab.metadata.source_path,
        vocab.metadata.source_hash,
        entries,
    );
    backup_and_write(output, &flagged.to_json_pretty()?)
        .with_context(|| format!("cannot write {}", output.display()))?;
    Ok(flagged)
}

pub fn cmd_flag(args: FlagArgs) -> Result<u8> {
    let blocklist = resolve_blocklist(args.blocklist.as_deref())?;
    if blocklist.is_none() {
        eprintln!(
            "{} no blocklist, only classifier flags will be normalized",
            "warning:".yellow().bold()
        );
    }
    let output = args.output.unwrap_or_else(|| args.vocab_file.clone());
    let flagged = flag_file(&args.vocab_file, &output, blocklist.as_ref())?;

    eprintln!("{} {}", "Flagged:".green(), output.display());
    eprintln!("  Terms: {}", flagged.metadata.term_count);
    if flagged.metadata.flagged_count > 0 {
        eprintln!(
            "  {}",
            format!("Flagged: {}", flagged.metadata.flagged_count).yellow()
        );
        let review_path = review_path_beside(&output);
        let queue = ReviewQueue::from_output(&flagged);
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

pub fn cmd_review(args: ReviewArgs) -> Result<u8> {
    let vocab = VocabularyOutput::read_from(&args.vocab_file)?;
    let queue = ReviewQueue::from_output(&vocab);
    if queue.is_empty() {
        eprintln!("{}", "No flagged terms.".green());
        return Ok(EXIT_OK);
    }

    let path = args
        .output
        .unwrap_or_else(|| review_path_beside(&args.vocab_file));
    queue.write_to(&path)?;
    for term in &queue.terms {
        println!("{}\t{}", term.canonical.bold(), term.flag_reason);
    }
    eprintln!(
        "{} {} ({} terms)",
        "Review queue:".yellow(),
        path.display(),
        queue.total_flagged
    );
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexicon_vocab::Blocklist;

    const VOCAB: &str = r#"{
        "metadata": {
            "schema_version": "1.0",
            "source_path": "books/bestiary.pdf",
            "source_hash": "abc",
            "extracted_at": "2024-01-01T00:00:00Z",
            "term_count": 2,
            "classified_count": 2,
            "flagged_count": 0
        },
        "entries": [
            {"id": "bestiary-beholder", "text": "Beholder", "source": "bestiary",
             "intent": "descriptive", "pos": "noun", "category": "creature",
             "canonical": "beholder", "mood": "ominous", "confidence": 0.9},
            {"id": "bestiary-ogre", "text": "Ogre", "source": "bestiary",
             "intent": "descriptive", "pos": "noun", "category": "creature",
             "canonical": "ogre", "mood": "brutal", "confidence": 0.8,
             "ip_flag": "trademarked"}
        ]
    }"#;

    #[test]
    fn flag_file_applies_blocklist_and_keeps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bestiary.vocab.json");
        std::fs::write(&path, VOCAB).unwrap();
        let blocklist = Blocklist::from_franchises([("dnd", vec!["beholder"])]).unwrap();

        let flagged = flag_file(&path, &path, Some(&blocklist)).unwrap();
        assert_eq!(flagged.metadata.source_hash, "abc");
        assert_eq!(flagged.metadata.flagged_count, 2);

        let back = VocabularyOutput::read_from(&path).unwrap();
        assert_eq!(back.entries[0].ip_flag.as_deref(), Some("blocklist:dnd"));
        assert_eq!(
            back.entries[1].ip_flag.as_deref(),
            Some("classification:trademarked")
        );
        assert!(dir.path().join("bestiary.vocab.json.bak").exists());
    }

    #[test]
    fn review_path_defaults_beside_vocabulary() {
        assert_eq!(
            review_path_beside(Path::new("vocab/master.vocab.json")),
            PathBuf::from("vocab/flagged.json")
        );
    }
}
