//! # lexicon-vocab
//!
//! Vocabulary model and consolidation for the lexicon pipeline.
//!
//! - [`entry`]: `VocabularyEntry` and the `.vocab.json` file format
//! - [`axes`]: the fixed 16-axis relevance vector with sparse serialization
//! - [`merge`]: confidence-weighted merging of duplicate entries
//! - [`blocklist`] and [`detector`]: IP flagging
//! - [`manifest`]: processed-source tracking for incremental runs
//! - [`consolidate`]: building the master vocabulary with backup-and-write
//! - [`review`]: the flagged-term review export

pub mod axes;
pub mod blocklist;
pub mod consolidate;
pub mod detector;
pub mod entry;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod merge;
pub mod review;

pub use axes::{AxisScores, AXIS_COUNT, AXIS_NAMES};
pub use blocklist::Blocklist;
pub use consolidate::{backup_and_write, consolidate, ConsolidationSummary, MASTER_FILE_NAME};
pub use detector::{detect_ip, flag_terms};
pub use entry::{PartOfSpeech, VocabularyEntry, VocabularyMetadata, VocabularyOutput};
pub use error::{BlocklistError, ManifestError, Result, VocabError};
pub use hash::hash_file;
pub use manifest::{Manifest, ManifestEntry, MANIFEST_FILE_NAME};
pub use merge::merge_duplicates;
pub use review::{FlaggedTerm, ReviewQueue, REVIEW_FILE_NAME};
