//! Confidence-weighted merging of duplicate entries.
//!
//! All entries sharing a canonical form collapse into one:
//!
//! - the highest-confidence entry (first in input order on ties) supplies the
//!   descriptive fields,
//! - sources are joined in first-seen order,
//! - tags are the sorted union,
//! - each axis is the confidence-weighted mean, rounded to two decimals,
//! - confidence is the rounded mean, kept within the inputs' min/max,
//! - the first non-empty `ip_flag` is carried over.
//!
//! Sums are accumulated in sorted order so the numeric fields do not depend
//! on how the inputs happen to be ordered.

use crate::axes::{AxisScores, AXIS_COUNT};
use crate::entry::VocabularyEntry;
use crate::error::{Result, VocabError};
use std::collections::{BTreeSet, HashSet};

/// Separator used when joining merged sources.
pub const SOURCE_SEPARATOR: &str = "; ";

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sorted_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Merge entries that share a canonical form.
///
/// A single entry is returned as-is. Errors on an empty input or on entries
/// whose canonical forms differ.
pub fn merge_duplicates(entries: Vec<VocabularyEntry>) -> Result<VocabularyEntry> {
    let canonical = match entries.first() {
        Some(first) => first.canonical.clone(),
        None => return Err(VocabError::EmptyMerge),
    };
    if let Some(other) = entries.iter().find(|e| e.canonical != canonical) {
        return Err(VocabError::CanonicalMismatch {
            expected: canonical,
            found: other.canonical.clone(),
        });
    }

    if entries.len() == 1 {
        return entries.into_iter().next().ok_or(VocabError::EmptyMerge);
    }

    // Confidence descending, original index ascending.
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        entries[b]
            .confidence
            .total_cmp(&entries[a].confidence)
            .then(a.cmp(&b))
    });
    let base = &entries[order[0]];

    let mut seen = HashSet::new();
    let sources: Vec<&str> = entries
        .iter()
        .map(|e| e.source.as_str())
        .filter(|s| seen.insert(*s))
        .collect();

    let tags: BTreeSet<&str> = entries
        .iter()
        .flat_map(|e| e.tags.iter().map(String::as_str))
        .collect();

    let ip_flag = entries
        .iter()
        .find(|e| e.has_ip_flag())
        .and_then(|e| e.ip_flag.clone());

    let merged = VocabularyEntry {
        id: base.id.clone(),
        text: base.text.clone(),
        source: sources.join(SOURCE_SEPARATOR),
        genre: base.genre.clone(),
        intent: base.intent.clone(),
        pos: base.pos,
        axes: merge_axes(&entries),
        tags: tags.into_iter().map(str::to_string).collect(),
        category: base.category.clone(),
        canonical,
        mood: base.mood.clone(),
        energy: base.energy.clone(),
        confidence: merge_confidence(&entries),
        secondary_intents: base.secondary_intents.clone(),
        ip_flag,
    };
    Ok(merged)
}

fn merge_confidence(entries: &[VocabularyEntry]) -> f64 {
    let confidences: Vec<f64> = entries.iter().map(|e| e.confidence).collect();
    let min = confidences.iter().copied().fold(f64::INFINITY, f64::min);
    let max = confidences.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = sorted_sum(confidences) / entries.len() as f64;
    round2(mean).clamp(min, max)
}

fn merge_axes(entries: &[VocabularyEntry]) -> AxisScores {
    let total = sorted_sum(entries.iter().map(|e| e.confidence).collect());
    if total == 0.0 {
        return AxisScores::new();
    }

    let mut merged = [0.0; AXIS_COUNT];
    for (idx, slot) in merged.iter_mut().enumerate() {
        let weighted = sorted_sum(
            entries
                .iter()
                .map(|e| e.axes.value(idx) * e.confidence)
                .collect(),
        );
        *slot = round2(weighted / total).clamp(0.0, 1.0);
    }
    // Every slot is a clamped mean of values already in [0, 1].
    AxisScores::from_values(merged).unwrap_or_default()
}
