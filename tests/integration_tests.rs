//! Integration tests for the complete Lexicon pipeline
//!
//! These tests drive the crates together the way the CLI does:
//! - documents → batch run → per-document vocabularies + manifest
//! - per-document vocabularies → consolidation → master + review queue
//!
//! Classification is faked so the tests run offline.
//!
//! Run with: cargo test --test integration_tests

use lexicon_batch::{
    BatchConfig, BatchOrchestrator, DocumentPipeline, DocumentReader, DocumentStatus,
    EXIT_SUCCESS,
};
use lexicon_ingest::{
    CandidateTerm, ClassifyError, ContentBlock, DocumentFormat, HeuristicExtractor, IngestError,
    ParsedDocument, TermClassifier,
};
use lexicon_vocab::{
    consolidate, AxisScores, Blocklist, ReviewQueue, VocabularyEntry, VocabularyOutput,
    MASTER_FILE_NAME,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

// ============================================================================
// Fakes
// ============================================================================

/// Treats every document as UTF-8 text, one page per form feed.
struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn read(&self, path: &Path) -> Result<ParsedDocument, IngestError> {
        let text = fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let blocks = text
            .split('\x0C')
            .enumerate()
            .map(|(i, page)| ContentBlock {
                text: page.trim().to_string(),
                page: Some(i + 1),
                chapter: None,
            })
            .collect();
        Ok(ParsedDocument {
            source: path.display().to_string(),
            format: DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Pdf),
            metadata: Default::default(),
            blocks,
        })
    }
}

/// Confidence depends on the document so merges have a clear winner.
struct ByDocumentClassifier;

impl TermClassifier for ByDocumentClassifier {
    fn classify(
        &self,
        candidate: &CandidateTerm,
        source: &str,
    ) -> Result<VocabularyEntry, ClassifyError> {
        let (confidence, mood) = if source == "grimoire" {
            (0.95, "arcane")
        } else {
            (0.7, "grim")
        };
        let axes = if candidate.lemma == "fireball" {
            AxisScores::new()
                .with("fire", 0.9)
                .map_err(|reason| ClassifyError::InvalidResponse {
                    term: candidate.text.clone(),
                    reason,
                })?
        } else {
            AxisScores::new()
        };
        Ok(VocabularyEntry {
            id: format!("{source}-{}", candidate.lemma),
            text: candidate.text.clone(),
            source: source.to_string(),
            genre: "fantasy".into(),
            intent: "offensive".into(),
            pos: candidate.pos,
            axes,
            tags: Vec::new(),
            category: "spell".into(),
            canonical: candidate.lemma.clone(),
            mood: mood.into(),
            energy: String::new(),
            confidence,
            secondary_intents: Vec::new(),
            ip_flag: None,
        })
    }
}

fn pipeline() -> DocumentPipeline {
    DocumentPipeline::new(
        Arc::new(HeuristicExtractor::new()),
        Arc::new(ByDocumentClassifier),
    )
    .with_reader(Arc::new(PlainTextReader))
}

fn vocab_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy();
            name.ends_with(".vocab.json") && name != MASTER_FILE_NAME
        })
        .collect();
    files.sort();
    files
}

// ============================================================================
// Batch → consolidate
// ============================================================================

#[test]
fn test_batch_then_consolidate() {
    let dir = tempdir().unwrap();
    let docs = dir.path().join("docs");
    let vocab = dir.path().join("vocab");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("grimoire.pdf"),
        "The fireball scorched the tower.\x0CA beholder watched.",
    )
    .unwrap();
    fs::write(docs.join("chronicle.epub"), "Another fireball lit the citadel.").unwrap();

    let blocklist = Blocklist::from_franchises([("dnd", vec!["beholder"])]).unwrap();
    let orchestrator = BatchOrchestrator::open(
        BatchConfig::new(&docs, &vocab),
        pipeline().with_blocklist(blocklist.clone()),
    )
    .unwrap();
    let summary = orchestrator.run().unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.exit_code(), EXIT_SUCCESS);

    let files = vocab_files(&vocab);
    assert_eq!(files.len(), 2);

    let master_path = vocab.join(MASTER_FILE_NAME);
    let report = consolidate(&files, &master_path, Some(&blocklist)).unwrap();
    assert!(report.added.contains("fireball"));
    assert!(report.flagged.contains("beholder"));
    assert!(report.updated.is_empty() && report.removed.is_empty());

    let master = VocabularyOutput::read_from(&master_path).unwrap();
    assert_eq!(master.metadata.source_path, "consolidated");
    let canonicals: Vec<&str> = master.entries.iter().map(|e| e.canonical.as_str()).collect();
    let mut sorted = canonicals.clone();
    sorted.sort();
    assert_eq!(canonicals, sorted);

    let fireball = master
        .entries
        .iter()
        .find(|e| e.canonical == "fireball")
        .unwrap();
    assert_eq!(fireball.source, "chronicle; grimoire");
    assert_eq!(fireball.mood, "arcane");
    assert!(fireball.confidence >= 0.7 && fireball.confidence <= 0.95);
    assert_eq!(fireball.axes.get("fire"), Some(0.9));

    let queue = ReviewQueue::from_output(&master);
    assert_eq!(queue.terms.len(), 1);
    assert_eq!(queue.terms[0].flag_reason, "blocklist:dnd");

    // Nothing changed: the second consolidation is a no-op report.
    let again = consolidate(&files, &master_path, Some(&blocklist)).unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_rerun_processes_only_changed_documents() {
    let dir = tempdir().unwrap();
    let docs = dir.path().join("docs");
    let vocab = dir.path().join("vocab");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("a.pdf"), "A basilisk slept.").unwrap();
    fs::write(docs.join("b.pdf"), "A wyvern hunted.").unwrap();

    let config = BatchConfig::new(&docs, &vocab);
    BatchOrchestrator::open(config.clone(), pipeline())
        .unwrap()
        .run()
        .unwrap();

    fs::write(docs.join("b.pdf"), "A manticore hunted.").unwrap();
    let results: Vec<_> = BatchOrchestrator::open(config, pipeline())
        .unwrap()
        .process()
        .unwrap()
        .collect();

    assert_eq!(results[0].status, DocumentStatus::Skipped);
    assert_eq!(results[0].source_path, docs.join("a.pdf"));
    assert_eq!(results[1].status, DocumentStatus::Success);

    let master_path = vocab.join(MASTER_FILE_NAME);
    let files = vocab_files(&vocab);
    let report = consolidate(&files, &master_path, None).unwrap();
    assert!(report.added.contains("manticore"));
    assert!(!report.added.contains("wyvern"));
}
