//! Supported document formats and the parsed representation.

use crate::error::IngestError;
use crate::{epub, pdf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File extensions picked up by directory discovery (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "epub"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Epub,
}

impl DocumentFormat {
    /// Format for `path`, chosen by case-insensitive extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
        }
    }

    pub fn parse(&self, path: &Path) -> Result<ParsedDocument, IngestError> {
        match self {
            Self::Pdf => pdf::parse(path),
            Self::Epub => epub::parse(path),
        }
    }
}

/// A run of normalized text with its position in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub text: String,
    /// 1-indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// 1-indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub source: String,
    pub format: DocumentFormat,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub blocks: Vec<ContentBlock>,
}

impl ParsedDocument {
    /// Non-empty blocks joined by a blank line.
    pub fn full_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Parse `path` with the parser for its extension.
pub fn parse_document(path: &Path) -> Result<ParsedDocument, IngestError> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(path = %path.display(), format = format.as_str(), "parsing document");
    format.parse(path)
}
