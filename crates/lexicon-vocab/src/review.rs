//! Human review export for flagged entries.
//!
//! The queue is write-only from the pipeline's point of view: reviewers edit
//! `reviewed`, `decision` and `notes` by hand and nothing reads them back.

use crate::entry::VocabularyOutput;
use crate::error::{Result, VocabError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const REVIEW_FILE_NAME: &str = "flagged.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedTerm {
    pub canonical: String,
    pub text: String,
    pub source: String,
    pub flag_reason: String,
    pub confidence: f64,
    pub category: String,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueue {
    pub generated_at: DateTime<Utc>,
    pub total_flagged: usize,
    pub reviewed_count: usize,
    pub terms: Vec<FlaggedTerm>,
}

impl ReviewQueue {
    /// Collect every flagged entry of `output`, sorted by canonical form.
    pub fn from_output(output: &VocabularyOutput) -> Self {
        let mut terms: Vec<FlaggedTerm> = output
            .entries
            .iter()
            .filter(|e| e.has_ip_flag())
            .map(|e| FlaggedTerm {
                canonical: e.canonical.clone(),
                text: e.text.clone(),
                source: e.source.clone(),
                flag_reason: e.ip_flag.clone().unwrap_or_default(),
                confidence: e.confidence,
                category: e.category.clone(),
                reviewed: false,
                decision: String::new(),
                notes: String::new(),
            })
            .collect();
        terms.sort_by(|a, b| a.canonical.cmp(&b.canonical));

        Self {
            generated_at: Utc::now(),
            total_flagged: terms.len(),
            reviewed_count: 0,
            terms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| VocabError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| VocabError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::entry;

    #[test]
    fn only_flagged_entries_are_queued_in_canonical_order() {
        let output = VocabularyOutput::from_entries(
            "master",
            "",
            vec![
                entry("zorn", "a", 0.9).with_ip_flag(Some("blocklist:misc".into())),
                entry("fireball", "a", 0.9),
                entry("beholder", "b", 0.8).with_ip_flag(Some("blocklist:dnd".into())),
                entry("ember", "b", 0.8).with_ip_flag(Some(String::new())),
            ],
        );

        let queue = ReviewQueue::from_output(&output);
        let canonicals: Vec<&str> = queue.terms.iter().map(|t| t.canonical.as_str()).collect();
        assert_eq!(canonicals, vec!["beholder", "zorn"]);
        assert_eq!(queue.total_flagged, 2);
        assert_eq!(queue.reviewed_count, 0);
        assert_eq!(queue.terms[0].flag_reason, "blocklist:dnd");
        assert!(!queue.terms[0].reviewed);
    }

    #[test]
    fn write_to_produces_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let output = VocabularyOutput::from_entries(
            "master",
            "",
            vec![entry("beholder", "mm", 0.8).with_ip_flag(Some("blocklist:dnd".into()))],
        );
        let path = dir.path().join(REVIEW_FILE_NAME);
        ReviewQueue::from_output(&output).write_to(&path).unwrap();

        let back: ReviewQueue = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.terms.len(), 1);
        assert_eq!(back.terms[0].decision, "");
    }
}
