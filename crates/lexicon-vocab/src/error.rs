//! Error types for vocabulary files, merging, blocklists and manifests.

use std::path::PathBuf;

pub type Result<T, E = VocabError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid vocabulary JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Cannot merge an empty set of entries")]
    EmptyMerge,

    #[error("Canonical mismatch in merge bucket: expected '{expected}', found '{found}'")]
    CanonicalMismatch { expected: String, found: String },
}

impl VocabError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O error on manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest file exists but does not match the schema. Resumability
    /// state is at stake, so this is never papered over with an empty manifest.
    #[error("Corrupt manifest {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BlocklistError {
    #[error("I/O error reading blocklist {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid blocklist JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to compile pattern for franchise '{franchise}': {source}")]
    Pattern {
        franchise: String,
        #[source]
        source: regex::Error,
    },
}
