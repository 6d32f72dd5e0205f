//! Vocabulary entry and the persisted `.vocab.json` document.

use crate::axes::AxisScores;
use crate::error::{Result, VocabError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Schema version written into every vocabulary file.
pub const VOCAB_SCHEMA_VERSION: &str = "1.0";

/// Entries above this confidence count as classified.
pub const CLASSIFIED_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Phrase,
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Phrase => "phrase",
        }
    }
}

fn default_genre() -> String {
    "fantasy".to_string()
}

/// One classified term.
///
/// Entries are values: flagging and merging build new entries instead of
/// mutating existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    /// Stable identifier derived from source and text (e.g. `phb-fireball`).
    pub id: String,
    pub text: String,
    /// Document identifier, or a `"; "`-joined list after merging.
    pub source: String,
    #[serde(default = "default_genre")]
    pub genre: String,
    pub intent: String,
    pub pos: PartOfSpeech,
    #[serde(default)]
    pub axes: AxisScores,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
    /// Normalized lowercase form; the deduplication key.
    pub canonical: String,
    pub mood: String,
    #[serde(default)]
    pub energy: String,
    pub confidence: f64,
    #[serde(default)]
    pub secondary_intents: Vec<String>,
    /// `source:detail` pairs joined by `;` (e.g. `blocklist:dnd`).
    #[serde(default)]
    pub ip_flag: Option<String>,
}

impl VocabularyEntry {
    pub fn validate(&self) -> Result<()> {
        if self.canonical.trim().is_empty() {
            return Err(VocabError::InvalidEntry(format!(
                "entry '{}' has an empty canonical form",
                self.id
            )));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(VocabError::InvalidEntry(format!(
                "entry '{}' has confidence {} outside [0, 1]",
                self.id, self.confidence
            )));
        }
        Ok(())
    }

    pub fn has_ip_flag(&self) -> bool {
        self.ip_flag.as_deref().is_some_and(|flag| !flag.is_empty())
    }

    /// Returns this entry with `ip_flag` replaced.
    pub fn with_ip_flag(self, ip_flag: Option<String>) -> Self {
        Self { ip_flag, ..self }
    }

    /// Field-for-field equality, ignoring `ip_flag`.
    pub fn same_content(&self, other: &Self) -> bool {
        // Exhaustive so that a new field cannot be silently left out.
        let Self {
            id,
            text,
            source,
            genre,
            intent,
            pos,
            axes,
            tags,
            category,
            canonical,
            mood,
            energy,
            confidence,
            secondary_intents,
            ip_flag: _,
        } = self;
        *id == other.id
            && *text == other.text
            && *source == other.source
            && *genre == other.genre
            && *intent == other.intent
            && *pos == other.pos
            && *axes == other.axes
            && same_tags(tags, &other.tags)
            && *category == other.category
            && *canonical == other.canonical
            && *mood == other.mood
            && *energy == other.energy
            && *confidence == other.confidence
            && *secondary_intents == other.secondary_intents
    }
}

/// Tags are a set: order and repeats do not matter.
fn same_tags(a: &[String], b: &[String]) -> bool {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyMetadata {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub source_path: String,
    pub source_hash: String,
    pub extracted_at: DateTime<Utc>,
    pub term_count: usize,
    pub classified_count: usize,
    #[serde(default)]
    pub flagged_count: usize,
}

fn default_schema_version() -> String {
    VOCAB_SCHEMA_VERSION.to_string()
}

/// A per-document or master vocabulary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyOutput {
    pub metadata: VocabularyMetadata,
    #[serde(default)]
    pub entries: Vec<VocabularyEntry>,
}

impl VocabularyOutput {
    /// Build an output with counts computed from `entries`, sorted by canonical form.
    pub fn from_entries(
        source_path: impl Into<String>,
        source_hash: impl Into<String>,
        mut entries: Vec<VocabularyEntry>,
    ) -> Self {
        entries.sort_by(|a, b| a.canonical.cmp(&b.canonical));
        let metadata = VocabularyMetadata {
            schema_version: VOCAB_SCHEMA_VERSION.to_string(),
            source_path: source_path.into(),
            source_hash: source_hash.into(),
            extracted_at: Utc::now(),
            term_count: entries.len(),
            classified_count: entries
                .iter()
                .filter(|e| e.confidence > CLASSIFIED_THRESHOLD)
                .count(),
            flagged_count: entries.iter().filter(|e| e.has_ip_flag()).count(),
        };
        Self { metadata, entries }
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| VocabError::io(path, e))?;
        let output: Self =
            serde_json::from_str(&contents).map_err(|e| VocabError::json(path, e))?;
        for entry in &output.entries {
            entry.validate()?;
        }
        Ok(output)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| VocabError::io(parent, e))?;
        }
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|e| VocabError::io(path, e))?;
        Ok(())
    }
}
