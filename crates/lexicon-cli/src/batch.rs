//! `lexicon batch`

use crate::resolve_blocklist;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use lexicon_batch::{
    discover, BatchConfig, BatchOrchestrator, BatchSummary, DocumentPipeline, DocumentResult,
    DocumentStatus, EXIT_NO_INPUT,
};
use lexicon_ingest::{anthropic_classifier, ClassifierConfig, HeuristicExtractor};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ERROR_LOG_NAME: &str = "batch-errors.log";
const MAX_PRINTED_ERRORS: usize = 10;
const AUTO_WORKER_CAP: usize = 8;

#[derive(Args)]
pub struct BatchArgs {
    /// Directory containing PDF/EPUB documents
    input_dir: PathBuf,

    /// Output directory for .vocab.json files (default: <input_dir>/output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parallel workers (0 = one per CPU, at most 8)
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Reprocess every document, ignoring the manifest
    #[arg(short, long)]
    force: bool,

    /// IP blocklist JSON (default: data/ip-blocklist.json if present)
    #[arg(short, long)]
    blocklist: Option<PathBuf>,
}

pub fn cmd_batch(args: BatchArgs, quiet: bool) -> Result<u8> {
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| args.input_dir.join("output"));
    let workers = if args.workers == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(AUTO_WORKER_CAP)
    } else {
        args.workers
    };

    let documents = discover(&args.input_dir)?;
    if documents.is_empty() {
        eprintln!(
            "{}",
            format!("No PDF or EPUB files found in {}", args.input_dir.display()).yellow()
        );
        return Ok(EXIT_NO_INPUT as u8);
    }

    let classifier = anthropic_classifier(ClassifierConfig::from_env()?)
        .context("cannot set up term classification")?;
    let mut pipeline =
        DocumentPipeline::new(Arc::new(HeuristicExtractor::new()), Arc::from(classifier));
    if let Some(blocklist) = resolve_blocklist(args.blocklist.as_deref())? {
        pipeline = pipeline.with_blocklist(blocklist);
    }

    let mut config = BatchConfig::new(&args.input_dir, &output_dir);
    config.workers = workers;
    config.force_reprocess = args.force;
    let orchestrator = BatchOrchestrator::open(config, pipeline)?;

    if !quiet {
        eprintln!(
            "{}",
            format!(
                "Found {} document(s) in {}",
                documents.len(),
                args.input_dir.display()
            )
            .cyan()
        );
        eprintln!("{}", format!("Output directory: {}", output_dir.display()).cyan());
        eprintln!(
            "{}",
            format!("Workers: {}", orchestrator.config().effective_workers()).cyan()
        );
        if args.force {
            eprintln!("{}", "Force mode: reprocessing all documents".yellow());
        }
        eprintln!();
    }

    let orchestrator = orchestrator.with_progress(Arc::new(move |result: &DocumentResult| {
        print_result(result, quiet)
    }));
    let summary = orchestrator.run()?;

    print_summary(&summary, quiet);
    if !summary.errors.is_empty() {
        let log = write_error_log(&summary, &output_dir)?;
        eprintln!(
            "\n{}",
            format!("Error log written to: {}", log.display()).yellow()
        );
    }
    Ok(u8::try_from(summary.exit_code()).unwrap_or(1))
}

fn print_result(result: &DocumentResult, quiet: bool) {
    let name = result.document_name();
    match result.status {
        DocumentStatus::Success if !quiet => eprintln!(
            "  {} {} ({} terms, {:.1}s)",
            "OK".green(),
            name,
            result.term_count,
            result.duration.as_secs_f64()
        ),
        DocumentStatus::Skipped if !quiet => {
            eprintln!("  {} {} (already processed)", "SKIP".yellow(), name)
        }
        DocumentStatus::Failed => eprintln!(
            "  {} {}: {}",
            "FAIL".red(),
            name,
            result.error.as_deref().unwrap_or("unknown error")
        ),
        _ => {}
    }
}

fn print_summary(summary: &BatchSummary, quiet: bool) {
    eprintln!();
    eprintln!("{}", "Batch Processing Complete".bold());
    eprintln!();
    eprintln!(
        "  {} {} total",
        "Documents:".cyan(),
        summary.total_documents
    );
    eprintln!("    - Processed: {}", summary.processed.to_string().green());
    eprintln!(
        "    - Skipped:   {} (already processed)",
        summary.skipped.to_string().yellow()
    );
    if summary.failed > 0 {
        eprintln!("    - Failed:    {}", summary.failed.to_string().red());
    }
    eprintln!();
    eprintln!("  {} {}", "Terms extracted:".cyan(), summary.total_terms);
    eprintln!("  {} {}", "Duration:".cyan(), format_duration(summary.duration));

    if !summary.errors.is_empty() && !quiet {
        eprintln!();
        eprintln!("{}", "Errors:".red().bold());
        for error in summary.errors.iter().take(MAX_PRINTED_ERRORS) {
            eprintln!("  - {error}");
        }
        if summary.errors.len() > MAX_PRINTED_ERRORS {
            eprintln!(
                "  ... and {} more",
                summary.errors.len() - MAX_PRINTED_ERRORS
            );
        }
    }
}

fn write_error_log(summary: &BatchSummary, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;
    let path = output_dir.join(ERROR_LOG_NAME);
    let mut body = String::from("Batch Processing Errors\n=======================\n\n");
    for error in &summary.errors {
        body.push_str("- ");
        body.push_str(error);
        body.push('\n');
    }
    fs::write(&path, body).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

/// `12.3s`, `4m 5s` or `1h 2m`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let whole = duration.as_secs();
    if whole < 3600 {
        format!("{}m {}s", whole / 60, whole % 60)
    } else {
        format!("{}h {}m", whole / 3600, (whole % 3600) / 60)
    }
}
