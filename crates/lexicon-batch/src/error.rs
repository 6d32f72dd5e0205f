//! Batch-level and per-document errors.

use lexicon_ingest::IngestError;
use lexicon_vocab::{BlocklistError, ManifestError, VocabError};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("workers must be between {min} and {max}, got {value}")]
    WorkerCount { value: usize, min: usize, max: usize },
}

/// Failures that stop a whole run before or while it starts.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Invalid batch configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Blocklist(#[from] BlocklistError),

    #[error("Cannot read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Failure of one attempt at one document. Recorded on the result, never
/// propagated out of the run.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Vocab(#[from] VocabError),

    #[error("Cannot hash {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document pipeline panicked: {0}")]
    Panicked(String),
}
