//! The per-document pipeline: parse, extract, classify, flag, write.

use crate::error::DocumentError;
use lexicon_ingest::{
    parse_document, IngestError, ParsedDocument, TermClassifier, TermExtractor,
};
use lexicon_vocab::{flag_terms, hash_file, Blocklist, VocabularyEntry, VocabularyOutput};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Suffix of per-document vocabulary files.
pub const VOCAB_SUFFIX: &str = ".vocab.json";

/// Turns a source file into text blocks.
pub trait DocumentReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<ParsedDocument, IngestError>;
}

/// Dispatches on the file extension to the PDF or EPUB parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatReader;

impl DocumentReader for FormatReader {
    fn read(&self, path: &Path) -> Result<ParsedDocument, IngestError> {
        parse_document(path)
    }
}

/// Identifier recorded as `source` on every entry: the file stem.
pub fn document_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `<output_dir>/<file name>.vocab.json`. The full file name keeps
/// `tome.pdf` and `tome.epub` from writing to the same output.
pub fn vocab_output_path(output_dir: &Path, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| document_id(source));
    output_dir.join(format!("{name}{VOCAB_SUFFIX}"))
}

/// What one successful pass over a document produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub output_path: PathBuf,
    pub term_count: usize,
    /// Hash of the source as it was before it was read.
    pub source_hash: String,
}

/// Collaborators shared by all workers. Cheap to clone.
#[derive(Clone)]
pub struct DocumentPipeline {
    reader: Arc<dyn DocumentReader>,
    extractor: Arc<dyn TermExtractor>,
    classifier: Arc<dyn TermClassifier>,
    blocklist: Option<Arc<Blocklist>>,
}

impl DocumentPipeline {
    pub fn new(extractor: Arc<dyn TermExtractor>, classifier: Arc<dyn TermClassifier>) -> Self {
        Self {
            reader: Arc::new(FormatReader),
            extractor,
            classifier,
            blocklist: None,
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_blocklist(mut self, blocklist: Blocklist) -> Self {
        self.blocklist = Some(Arc::new(blocklist));
        self
    }

    pub fn has_blocklist(&self) -> bool {
        self.blocklist.is_some()
    }

    /// Run every step for `source` and write its vocabulary under `output_dir`.
    ///
    /// A term the classifier rejects is dropped; the document still succeeds.
    /// No text or no candidates gives an empty vocabulary, not an error.
    /// The source is hashed before it is read, so an edit made while the
    /// pipeline runs leaves the recorded hash stale and the document is
    /// processed again next time.
    pub fn run(&self, source: &Path, output_dir: &Path) -> Result<PipelineOutput, DocumentError> {
        let source_hash = hash_file(source).map_err(|e| DocumentError::Hash {
            path: source.to_path_buf(),
            source: e,
        })?;
        let document = self.reader.read(source)?;
        let text = document.full_text();
        let doc_id = document_id(source);

        let mut entries: Vec<VocabularyEntry> = Vec::new();
        if text.trim().is_empty() {
            tracing::info!(path = %source.display(), "no extractable text");
        } else {
            let candidates = self.extractor.extract(&text);
            tracing::debug!(
                path = %source.display(),
                candidates = candidates.len(),
                "extracted candidates"
            );
            for candidate in &candidates {
                match self.classifier.classify(candidate, &doc_id) {
                    Ok(entry) => entries.push(entry),
                    Err(err) => tracing::debug!(
                        term = %candidate.text,
                        error = %err,
                        "dropping unclassified term"
                    ),
                }
            }
        }

        let entries = flag_terms(&entries, self.blocklist.as_deref());
        let output = VocabularyOutput::from_entries(
            source.to_string_lossy(),
            source_hash.clone(),
            entries,
        );
        let output_path = vocab_output_path(output_dir, source);
        output.write_to(&output_path)?;

        Ok(PipelineOutput {
            output_path,
            term_count: output.metadata.term_count,
            source_hash,
        })
    }
}
