//! PDF text extraction via `pdf-extract`.

use crate::document::ParsedDocument;
use crate::error::IngestError;
use std::path::Path;

#[cfg(feature = "pdf")]
pub fn parse(path: &Path) -> Result<ParsedDocument, IngestError> {
    use crate::document::{ContentBlock, DocumentFormat};
    use crate::normalize::normalize_text;
    use std::collections::BTreeMap;

    let text = pdf_extract::extract_text(path).map_err(|e| IngestError::extraction(path, e))?;
    let blocks: Vec<ContentBlock> = split_pages(&text)
        .into_iter()
        .enumerate()
        .map(|(i, page)| ContentBlock {
            text: normalize_text(page),
            page: Some(i + 1),
            chapter: None,
        })
        .collect();

    let mut metadata = BTreeMap::new();
    metadata.insert("page_count".to_string(), blocks.len().to_string());
    if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
        metadata.insert("title".to_string(), name.to_string());
    }

    Ok(ParsedDocument {
        source: path.to_string_lossy().into_owned(),
        format: DocumentFormat::Pdf,
        metadata,
        blocks,
    })
}

#[cfg(not(feature = "pdf"))]
pub fn parse(_path: &Path) -> Result<ParsedDocument, IngestError> {
    Err(IngestError::FeatureNotEnabled { feature: "pdf" })
}

/// Pages are separated by form feeds in `pdf-extract` output.
#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
fn split_pages(text: &str) -> Vec<&str> {
    let mut pages: Vec<&str> = text.split('\x0C').collect();
    while pages.last().is_some_and(|p| p.trim().is_empty()) && pages.len() > 1 {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_feeds_split_pages() {
        assert_eq!(split_pages("one\x0Ctwo\x0C"), vec!["one", "two"]);
        assert_eq!(split_pages("only"), vec!["only"]);
        assert_eq!(split_pages(""), vec![""]);
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn missing_feature_is_reported() {
        let err = parse(Path::new("book.pdf")).unwrap_err();
        assert!(matches!(err, IngestError::FeatureNotEnabled { feature: "pdf" }));
    }
}
