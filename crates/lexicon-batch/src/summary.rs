//! Per-document results and the aggregate run summary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// All documents succeeded or were skipped.
pub const EXIT_SUCCESS: i32 = 0;
/// No supported documents were found.
pub const EXIT_NO_INPUT: i32 = 66;
/// At least one document failed.
pub const EXIT_PARTIAL: i32 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentStatus::Success => "success",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Skipped => "skipped",
        })
    }
}

/// Terminal outcome of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentResult {
    pub source_path: PathBuf,
    pub status: DocumentStatus,
    pub term_count: usize,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
    pub duration: Duration,
}

impl DocumentResult {
    pub fn success(
        source_path: PathBuf,
        output_path: PathBuf,
        term_count: usize,
        duration: Duration,
    ) -> Self {
        Self {
            source_path,
            status: DocumentStatus::Success,
            term_count,
            output_path: Some(output_path),
            error: None,
            duration,
        }
    }

    pub fn failed(source_path: PathBuf, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            source_path,
            status: DocumentStatus::Failed,
            term_count: 0,
            output_path: None,
            error: Some(error.into()),
            duration,
        }
    }

    pub fn skipped(source_path: PathBuf) -> Self {
        Self {
            source_path,
            status: DocumentStatus::Skipped,
            term_count: 0,
            output_path: None,
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// File name used to prefix error messages.
    pub fn document_name(&self) -> String {
        document_name(&self.source_path)
    }
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total_documents: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_terms: usize,
    pub duration: Duration,
    /// `"<file name>: <error>"` for each failed document, in completion order.
    pub errors: Vec<String>,
}

impl BatchSummary {
    pub fn new(total_documents: usize) -> Self {
        Self {
            total_documents,
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: &DocumentResult) {
        match result.status {
            DocumentStatus::Success => {
                self.processed += 1;
                self.total_terms += result.term_count;
            }
            DocumentStatus::Skipped => self.skipped += 1,
            DocumentStatus::Failed => {
                self.failed += 1;
                let message = result.error.as_deref().unwrap_or("unknown error");
                self.errors
                    .push(format!("{}: {}", result.document_name(), message));
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.total_documents == 0 {
            EXIT_NO_INPUT
        } else if self.failed == 0 {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn record_counts_each_status() {
        let mut summary = BatchSummary::new(3);
        summary.record(&DocumentResult::success(
            "in/a.pdf".into(),
            "out/a.vocab.json".into(),
            7,
            ms(10),
        ));
        summary.record(&DocumentResult::skipped("in/b.pdf".into()));
        summary.record(&DocumentResult::failed("in/c.epub".into(), "bad zip", ms(3)));

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_terms, 7);
        assert_eq!(summary.errors, vec!["c.epub: bad zip".to_string()]);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(BatchSummary::new(0).exit_code(), EXIT_NO_INPUT);

        let mut summary = BatchSummary::new(2);
        summary.record(&DocumentResult::skipped("a.pdf".into()));
        assert_eq!(summary.exit_code(), EXIT_SUCCESS);

        summary.record(&DocumentResult::failed("b.pdf".into(), "boom", ms(1)));
        assert_eq!(summary.exit_code(), EXIT_PARTIAL);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Skipped).unwrap(),
            "\"skipped\""
        );
        assert_eq!(DocumentStatus::Failed.to_string(), "failed");
    }
}
