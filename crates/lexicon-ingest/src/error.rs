//! Errors raised by the document and classification collaborators.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported document format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("{feature} support not compiled in. Rebuild with --features {feature}")]
    FeatureNotEnabled { feature: &'static str },

    #[error("Extraction failed for {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn extraction(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Extraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Classifier not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to reach classification API: {0}")]
    Network(String),

    #[error("Classification API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid classification for '{term}': {reason}")]
    InvalidResponse { term: String, reason: String },
}
