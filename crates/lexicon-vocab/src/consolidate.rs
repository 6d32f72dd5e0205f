//! Consolidation of per-document vocabularies into a master file.

use crate::blocklist::Blocklist;
use crate::detector::blocklist_flag;
use crate::entry::{VocabularyEntry, VocabularyOutput};
use crate::error::{Result, VocabError};
use crate::merge::merge_duplicates;
use chrono::Local;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `metadata.source_path` of a master vocabulary.
pub const CONSOLIDATED_SOURCE: &str = "consolidated";

/// Default master file name inside a vocabulary directory.
pub const MASTER_FILE_NAME: &str = "master.vocab.json";

/// Canonical forms that changed in one consolidation run. Reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationSummary {
    pub added: BTreeSet<String>,
    pub updated: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    /// Merged entries carrying an `ip_flag`, whether new, updated or unchanged.
    pub flagged: BTreeSet<String>,
}

impl ConsolidationSummary {
    /// True when nothing was added, updated or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

impl fmt::Display for ConsolidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.added.is_empty() {
            parts.push(format!("+{} new", self.added.len()));
        }
        if !self.updated.is_empty() {
            parts.push(format!("~{} updated", self.updated.len()));
        }
        if !self.removed.is_empty() {
            parts.push(format!("-{} removed", self.removed.len()));
        }
        if !self.flagged.is_empty() {
            parts.push(format!("!{} flagged", self.flagged.len()));
        }
        if parts.is_empty() {
            f.write_str("no changes")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Path of the rolling "latest" backup: `<master>.bak`.
pub fn latest_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn timestamped_backup_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    path.with_extension(format!("{stamp}.bak"))
}

/// Back up `path` if it exists, then replace it atomically with `content`.
///
/// Backups go to `<stem>.<YYYYmmdd_HHMMSS>.bak` and `<path>.bak`. The new
/// content is written to a temporary file in the same directory and renamed
/// over `path`, so readers see either the old or the new file in full.
/// Returns the timestamped backup path, if one was made.
pub fn backup_and_write(path: &Path, content: &str) -> Result<Option<PathBuf>> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| VocabError::io(&parent, e))?;

    let mut backup = None;
    if path.exists() {
        let stamped = timestamped_backup_path(path);
        fs::copy(path, &stamped).map_err(|e| VocabError::io(&stamped, e))?;
        let latest = latest_backup_path(path);
        fs::copy(path, &latest).map_err(|e| VocabError::io(&latest, e))?;
        tracing::debug!(
            path = %path.display(),
            backup = %stamped.display(),
            "backed up existing file"
        );
        backup = Some(stamped);
    }

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| VocabError::io(&parent, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| VocabError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| VocabError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| VocabError::io(path, e.error))?;

    Ok(backup)
}

/// Merge `vocab_files` into `master_path` and report what changed.
///
/// An existing master is read only as the baseline for the change report.
/// Entries are bucketed by canonical form across all files and each bucket is
/// merged. With a blocklist, merged entries that carry no flag yet are checked
/// against it. Any read or write failure aborts the run and leaves the
/// previous master in place.
pub fn consolidate(
    vocab_files: &[PathBuf],
    master_path: &Path,
    blocklist: Option<&Blocklist>,
) -> Result<ConsolidationSummary> {
    let baseline: HashMap<String, VocabularyEntry> = if master_path.exists() {
        VocabularyOutput::read_from(master_path)?
            .entries
            .into_iter()
            .map(|e| (e.canonical.clone(), e))
            .collect()
    } else {
        HashMap::new()
    };

    let mut buckets: BTreeMap<String, Vec<VocabularyEntry>> = BTreeMap::new();
    for file in vocab_files {
        let output = VocabularyOutput::read_from(file)?;
        tracing::debug!(
            path = %file.display(),
            entries = output.entries.len(),
            "loaded vocabulary"
        );
        for entry in output.entries {
            buckets.entry(entry.canonical.clone()).or_default().push(entry);
        }
    }

    let removed = baseline
        .keys()
        .filter(|canonical| !buckets.contains_key(*canonical))
        .cloned()
        .collect();
    let mut summary = ConsolidationSummary {
        removed,
        ..Default::default()
    };

    let mut merged_entries = Vec::with_capacity(buckets.len());

    for (canonical, bucket) in buckets {
        let mut merged = merge_duplicates(bucket)?;
        if let Some(list) = blocklist {
            if !merged.has_ip_flag() {
                if let Some(flag) = blocklist_flag(&merged, list) {
                    merged = merged.with_ip_flag(Some(flag));
                }
            }
        }

        match baseline.get(&canonical) {
            None => {
                summary.added.insert(canonical.clone());
            }
            Some(previous) if !previous.same_content(&merged) => {
                summary.updated.insert(canonical.clone());
            }
            Some(_) => {}
        }
        if merged.has_ip_flag() {
            summary.flagged.insert(canonical);
        }
        merged_entries.push(merged);
    }

    let master = VocabularyOutput::from_entries(CONSOLIDATED_SOURCE, "", merged_entries);
    backup_and_write(master_path, &master.to_json_pretty()?)?;

    tracing::info!(
        master = %master_path.display(),
        inputs = vocab_files.len(),
        terms = master.metadata.term_count,
        added = summary.added.len(),
        updated = summary.updated.len(),
        removed = summary.removed.len(),
        flagged = summary.flagged.len(),
        "consolidated vocabulary"
    );
    Ok(summary)
}
