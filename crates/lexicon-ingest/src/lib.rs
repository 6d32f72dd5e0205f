//! Document ingestion for Lexicon
//!
//! The collaborators the batch pipeline drives for each document:
//! - parsing PDF and EPUB files into normalized text blocks
//! - extracting candidate terms from that text
//! - classifying candidates into vocabulary entries
//!
//! PDF, EPUB and the Anthropic classifier sit behind the `pdf`, `epub` and
//! `anthropic` cargo features. Without them the corresponding calls fail
//! with a "not compiled in" error rather than being absent.

pub mod classify;
pub mod document;
pub mod epub;
pub mod error;
pub mod extract;
pub mod filter;
pub mod normalize;
pub mod pdf;

pub use classify::{
    anthropic_classifier, build_user_prompt, parse_classification, slugify, ClassifierConfig,
    TermClassifier,
};
pub use document::{parse_document, ContentBlock, DocumentFormat, ParsedDocument, SUPPORTED_EXTENSIONS};
pub use error::{ClassifyError, IngestError};
pub use extract::{CandidateTerm, HeuristicExtractor, TermExtractor};
pub use filter::TermFilter;
pub use normalize::normalize_text;

#[cfg(feature = "anthropic")]
pub use classify::AnthropicClassifier;
