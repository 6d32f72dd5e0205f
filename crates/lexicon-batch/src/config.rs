//! Batch run configuration.

use crate::error::ConfigError;
use lexicon_vocab::MANIFEST_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 16;
const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory scanned (non-recursively) for documents.
    pub input_dir: PathBuf,
    /// Directory receiving `<stem>.vocab.json` files.
    pub output_dir: PathBuf,
    #[serde(alias = "max_workers")]
    pub workers: usize,
    /// Process every document even if the manifest says it is unchanged.
    pub force_reprocess: bool,
    pub blocklist_path: Option<PathBuf>,
    /// Defaults to `<output_dir>/.lexicon-manifest.json`.
    pub manifest_path: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("docs"),
            output_dir: PathBuf::from("vocab"),
            workers: DEFAULT_WORKERS,
            force_reprocess: false,
            blocklist_path: None,
            manifest_path: None,
        }
    }
}

impl BatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::WorkerCount {
                value: self.workers,
                min: MIN_WORKERS,
                max: MAX_WORKERS,
            });
        }
        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(MANIFEST_FILE_NAME))
    }

    /// Pool size: configured workers, capped by available parallelism.
    pub fn effective_workers(&self) -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(DEFAULT_WORKERS);
        self.workers.clamp(MIN_WORKERS, MAX_WORKERS).min(cpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BatchConfig::new("in", "out");
        assert_eq!(config.workers, 4);
        assert!(!config.force_reprocess);
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("out").join(".lexicon-manifest.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn worker_count_is_bounded() {
        let mut config = BatchConfig::new("in", "out");
        config.workers = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WorkerCount { value: 0, .. })
        ));
        config.workers = 17;
        assert!(config.validate().is_err());
        config.workers = 16;
        assert!(config.validate().is_ok());
        assert!(config.effective_workers() >= 1 && config.effective_workers() <= 16);
    }

    #[test]
    fn deserializes_with_legacy_worker_key() {
        let config: BatchConfig =
            serde_json::from_str(r#"{"input_dir": "books", "max_workers": 8}"#).unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.output_dir, PathBuf::from("vocab"));
    }
}
