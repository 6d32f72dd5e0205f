//! Parallel, resumable processing of a document directory.

use crate::config::BatchConfig;
use crate::error::{BatchError, DocumentError};
use crate::pipeline::{DocumentPipeline, PipelineOutput};
use crate::summary::{BatchSummary, DocumentResult};
use lexicon_ingest::DocumentFormat;
use lexicon_vocab::{Blocklist, Manifest};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Called with every result just before it is yielded.
pub type ProgressCallback = Arc<dyn Fn(&DocumentResult) + Send + Sync>;

// ============================================================================
// Discovery
// ============================================================================

/// Supported documents directly inside `input_dir`, sorted by path.
pub fn discover(input_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let meta = std::fs::metadata(input_dir).map_err(|source| BatchError::InputDir {
        path: input_dir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(BatchError::NotADirectory(input_dir.to_path_buf()));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| BatchError::InputDir {
            path: input_dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && DocumentFormat::from_path(entry.path()).is_some() {
            documents.push(entry.into_path());
        }
    }
    documents.sort();
    Ok(documents)
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct BatchOrchestrator {
    config: BatchConfig,
    manifest: Arc<Mutex<Manifest>>,
    manifest_path: PathBuf,
    pipeline: DocumentPipeline,
    on_complete: Option<ProgressCallback>,
}

impl BatchOrchestrator {
    /// Build from an already-loaded manifest.
    pub fn new(
        config: BatchConfig,
        manifest: Manifest,
        pipeline: DocumentPipeline,
    ) -> Result<Self, BatchError> {
        config.validate()?;
        let manifest_path = config.manifest_path();
        Ok(Self {
            config,
            manifest: Arc::new(Mutex::new(manifest)),
            manifest_path,
            pipeline,
            on_complete: None,
        })
    }

    /// Load the manifest named by `config`, and the blocklist if one is
    /// configured and the pipeline has none yet. A missing blocklist file is
    /// logged and ignored; a corrupt manifest is an error.
    pub fn open(config: BatchConfig, mut pipeline: DocumentPipeline) -> Result<Self, BatchError> {
        config.validate()?;
        let manifest = Manifest::load(&config.manifest_path())?;
        if let Some(path) = config.blocklist_path.as_deref() {
            if pipeline.has_blocklist() {
                tracing::debug!("pipeline already carries a blocklist");
            } else if path.exists() {
                pipeline = pipeline.with_blocklist(Blocklist::load(path)?);
            } else {
                tracing::warn!(path = %path.display(), "blocklist not found, skipping IP checks");
            }
        }
        Self::new(config, manifest, pipeline)
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Snapshot of the manifest as it stands now.
    pub fn manifest(&self) -> Manifest {
        self.manifest.lock().clone()
    }

    pub fn discover(&self) -> Result<Vec<PathBuf>, BatchError> {
        discover(&self.config.input_dir)
    }

    /// Start processing and return results as they complete.
    ///
    /// Skipped documents come first, then processed ones in completion order.
    /// Work continues on the pool even if the iterator is dropped early.
    pub fn process(&self) -> Result<BatchResults, BatchError> {
        let documents = self.discover()?;
        let total = documents.len();

        let mut skipped = VecDeque::new();
        let mut pending = Vec::new();
        {
            let manifest = self.manifest.lock();
            for path in documents {
                if self.config.force_reprocess || manifest.needs_processing(&path) {
                    pending.push(path);
                } else {
                    skipped.push_back(DocumentResult::skipped(path));
                }
            }
        }

        let workers = self.config.effective_workers();
        tracing::info!(
            total,
            pending = pending.len(),
            skipped = skipped.len(),
            workers,
            "starting batch"
        );

        let (tx, rx) = mpsc::channel();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lexicon-worker-{i}"))
            .build()?;

        for source in pending {
            let tx = tx.clone();
            let job = DocumentJob {
                source,
                output_dir: self.config.output_dir.clone(),
                pipeline: self.pipeline.clone(),
                manifest: Arc::clone(&self.manifest),
                manifest_path: self.manifest_path.clone(),
            };
            pool.spawn(move || {
                let result = job.execute();
                // The receiver may be gone; the manifest is already saved.
                let _ = tx.send(result);
            });
        }
        drop(tx);

        Ok(BatchResults {
            total,
            skipped,
            rx,
            on_complete: self.on_complete.clone(),
            _pool: pool,
        })
    }

    /// Process everything and aggregate.
    pub fn run(&self) -> Result<BatchSummary, BatchError> {
        let start = Instant::now();
        let results = self.process()?;
        let mut summary = BatchSummary::new(results.total());
        for result in results {
            summary.record(&result);
        }
        summary.duration = start.elapsed();
        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            terms = summary.total_terms,
            "batch finished"
        );
        Ok(summary)
    }
}

// ============================================================================
// Worker side
// ============================================================================

struct DocumentJob {
    source: PathBuf,
    output_dir: PathBuf,
    pipeline: DocumentPipeline,
    manifest: Arc<Mutex<Manifest>>,
    manifest_path: PathBuf,
}

impl DocumentJob {
    fn execute(self) -> DocumentResult {
        let start = Instant::now();
        let outcome = match self.attempt() {
            Ok(output) => Ok(output),
            Err(first) => {
                tracing::warn!(
                    path = %self.source.display(),
                    error = %first,
                    "document failed, retrying once"
                );
                self.attempt()
            }
        };

        match outcome {
            Ok(output) => match self.record(&output) {
                Ok(()) => {
                    tracing::info!(
                        path = %self.source.display(),
                        terms = output.term_count,
                        "document processed"
                    );
                    DocumentResult::success(
                        self.source,
                        output.output_path,
                        output.term_count,
                        start.elapsed(),
                    )
                }
                Err(err) => {
                    tracing::error!(
                        path = %self.source.display(),
                        error = %err,
                        "cannot record document in manifest"
                    );
                    DocumentResult::failed(self.source, err.to_string(), start.elapsed())
                }
            },
            Err(err) => {
                tracing::warn!(path = %self.source.display(), error = %err, "document failed");
                DocumentResult::failed(self.source, err.to_string(), start.elapsed())
            }
        }
    }

    /// A panicking reader or extractor fails this attempt instead of the run.
    fn attempt(&self) -> Result<PipelineOutput, DocumentError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.pipeline.run(&self.source, &self.output_dir)
        }))
        .unwrap_or_else(|payload| Err(DocumentError::Panicked(panic_message(payload.as_ref()))))
    }

    /// Update and persist under one lock so saves never interleave.
    fn record(&self, output: &PipelineOutput) -> Result<(), lexicon_vocab::ManifestError> {
        let mut manifest = self.manifest.lock();
        manifest.update_entry_with_hash(
            &self.source,
            output.source_hash.clone(),
            &output.output_path,
            output.term_count,
        );
        manifest.save(&self.manifest_path)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Result stream
// ============================================================================

/// Lazy stream of per-document results. Blocks in `next` until the next
/// document finishes.
pub struct BatchResults {
    total: usize,
    skipped: VecDeque<DocumentResult>,
    rx: Receiver<DocumentResult>,
    on_complete: Option<ProgressCallback>,
    _pool: rayon::ThreadPool,
}

impl BatchResults {
    /// Number of documents discovered, skipped ones included.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for BatchResults {
    type Item = DocumentResult;

    fn next(&mut self) -> Option<DocumentResult> {
        let result = match self.skipped.pop_front() {
            Some(result) => result,
            None => self.rx.recv().ok()?,
        };
        if let Some(callback) = &self.on_complete {
            callback(&result);
        }
        Some(result)
    }
}
