//! # lexicon-batch
//!
//! Runs the ingestion pipeline over a directory of documents with a bounded
//! worker pool. Each finished document is recorded in the manifest before
//! its result is handed back, so an interrupted run picks up where it
//! stopped.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod summary;

pub use config::BatchConfig;
pub use error::{BatchError, ConfigError, DocumentError};
pub use orchestrator::{discover, BatchOrchestrator, BatchResults, ProgressCallback};
pub use pipeline::{
    document_id, vocab_output_path, DocumentPipeline, DocumentReader, FormatReader,
    PipelineOutput, VOCAB_SUFFIX,
};
pub use summary::{
    BatchSummary, DocumentResult, DocumentStatus, EXIT_NO_INPUT, EXIT_PARTIAL, EXIT_SUCCESS,
};
