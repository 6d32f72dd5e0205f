//! Persisted record of processed sources, used for incremental runs.
//!
//! The manifest maps a source path to the hash it had when it was last
//! processed and the output that run produced. The same structure serves the
//! batch run (documents → per-document vocabularies) and consolidation
//! (per-document vocabularies → master).

use crate::error::ManifestError;
use crate::hash::hash_file;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_SCHEMA_VERSION: &str = "1.0";

/// Default manifest file name inside an output directory.
pub const MANIFEST_FILE_NAME: &str = ".lexicon-manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source_path: String,
    pub source_hash: String,
    #[serde(alias = "vocab_path")]
    pub output_path: String,
    pub processed_at: DateTime<Utc>,
    pub term_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub documents: BTreeMap<String, ManifestEntry>,
}

fn default_schema_version() -> String {
    MANIFEST_SCHEMA_VERSION.to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            last_updated: Utc::now(),
            documents: BTreeMap::new(),
        }
    }
}

/// Key under which `path` is stored.
pub fn manifest_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file yields an empty manifest; a file that
    /// cannot be parsed is [`ManifestError::Corrupt`].
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no manifest yet, starting empty");
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ManifestError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write as pretty JSON, creating parent directories. Not atomic.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ManifestError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, source_path: &Path) -> Option<&ManifestEntry> {
        self.documents.get(&manifest_key(source_path))
    }

    /// True when `source_path` is unknown or its content hash changed.
    ///
    /// Re-hashes the file on every call. An unreadable file also needs
    /// processing, so that the failure surfaces from the pipeline.
    pub fn needs_processing(&self, source_path: &Path) -> bool {
        let Some(entry) = self.get(source_path) else {
            return true;
        };
        match hash_file(source_path) {
            Ok(hash) => hash != entry.source_hash,
            Err(err) => {
                tracing::warn!(
                    path = %source_path.display(),
                    error = %err,
                    "cannot hash source, treating as changed"
                );
                true
            }
        }
    }

    /// Record `source_path` as processed now, with its current content hash.
    pub fn update_entry(
        &mut self,
        source_path: &Path,
        output_path: &Path,
        term_count: usize,
    ) -> Result<(), ManifestError> {
        let source_hash = hash_file(source_path).map_err(|source| ManifestError::Io {
            path: source_path.to_path_buf(),
            source,
        })?;
        self.update_entry_with_hash(source_path, source_hash, output_path, term_count);
        Ok(())
    }

    /// Record `source_path` as processed now, with a hash taken by the caller.
    ///
    /// Use this when the hash was taken before the source was read, so the
    /// entry describes the content the output was built from.
    pub fn update_entry_with_hash(
        &mut self,
        source_path: &Path,
        source_hash: String,
        output_path: &Path,
        term_count: usize,
    ) {
        let now = Utc::now();
        let key = manifest_key(source_path);
        self.documents.insert(
            key.clone(),
            ManifestEntry {
                source_path: key,
                source_hash,
                output_path: manifest_key(output_path),
                processed_at: now,
                term_count,
            },
        );
        self.last_updated = now;
    }

    pub fn remove_entry(&mut self, source_path: &str) -> Option<ManifestEntry> {
        let removed = self.documents.remove(source_path);
        if removed.is_some() {
            self.last_updated = Utc::now();
        }
        removed
    }

    /// Output paths of entries whose source is not in `current_sources`.
    pub fn orphaned_outputs<P: AsRef<Path>>(&self, current_sources: &[P]) -> Vec<PathBuf> {
        self.orphaned_sources(current_sources)
            .into_iter()
            .filter_map(|key| self.documents.get(&key))
            .map(|entry| PathBuf::from(&entry.output_path))
            .collect()
    }

    /// Keys of entries whose source is not in `current_sources`, in key order.
    pub fn orphaned_sources<P: AsRef<Path>>(&self, current_sources: &[P]) -> Vec<String> {
        let current: HashSet<String> = current_sources
            .iter()
            .map(|p| manifest_key(p.as_ref()))
            .collect();
        self.documents
            .keys()
            .filter(|key| !current.contains(*key))
            .cloned()
            .collect()
    }
}
