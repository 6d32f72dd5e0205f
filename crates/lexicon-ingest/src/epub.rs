//! EPUB text extraction.
//!
//! An EPUB is a zip container. `META-INF/container.xml` names the OPF
//! package document, whose spine lists the XHTML chapters in reading order.
//! Each spine item becomes one [`ContentBlock`](crate::document::ContentBlock)
//! with its 1-indexed chapter number.

use crate::document::ParsedDocument;
use crate::error::IngestError;
use std::path::Path;

#[cfg_attr(not(feature = "epub"), allow(dead_code))]
const CONTAINER_PATH: &str = "META-INF/container.xml";

#[cfg(feature = "epub")]
pub fn parse(path: &Path) -> Result<ParsedDocument, IngestError> {
    use crate::document::{ContentBlock, DocumentFormat};
    use crate::normalize::normalize_text;

    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| IngestError::extraction(path, format!("not a zip container: {e}")))?;

    let container = read_entry(&mut archive, CONTAINER_PATH)
        .map_err(|reason| IngestError::extraction(path, reason))?;
    let opf_path =
        rootfile_path(&container).map_err(|reason| IngestError::extraction(path, reason))?;
    let opf = read_entry(&mut archive, &opf_path)
        .map_err(|reason| IngestError::extraction(path, reason))?;
    let package = parse_package(&opf).map_err(|reason| IngestError::extraction(path, reason))?;

    let mut blocks = Vec::new();
    for (idx, href) in package.spine.iter().enumerate() {
        let entry = resolve_href(&opf_path, href);
        let html = match read_entry(&mut archive, &entry) {
            Ok(html) => html,
            Err(reason) => {
                tracing::warn!(
                    path = %path.display(),
                    chapter = idx + 1,
                    error = %reason,
                    "skipping unreadable chapter"
                );
                continue;
            }
        };
        let text = normalize_text(&xhtml_text(&html));
        if text.is_empty() {
            continue;
        }
        blocks.push(ContentBlock {
            text,
            page: None,
            chapter: Some(idx + 1),
        });
    }

    let mut metadata = package.metadata;
    metadata.insert("chapter_count".to_string(), package.spine.len().to_string());

    Ok(ParsedDocument {
        source: path.to_string_lossy().into_owned(),
        format: DocumentFormat::Epub,
        metadata,
        blocks,
    })
}

#[cfg(not(feature = "epub"))]
pub fn parse(_path: &Path) -> Result<ParsedDocument, IngestError> {
    Err(IngestError::FeatureNotEnabled { feature: "epub" })
}

#[cfg(feature = "epub")]
fn read_entry<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<String, String> {
    use std::io::Read;

    let mut file = archive
        .by_name(name)
        .map_err(|e| format!("missing {name}: {e}"))?;
    let mut out = String::new();
    file.read_to_string(&mut out)
        .map_err(|e| format!("failed to read {name}: {e}"))?;
    Ok(out)
}

/// `full-path` of the first `<rootfile>` in `container.xml`.
#[cfg(feature = "epub")]
fn rootfile_path(container_xml: &str) -> Result<String, String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(container_xml);
    reader.trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"rootfile" => {
                let attr = e
                    .try_get_attribute("full-path")
                    .map_err(|err| format!("invalid rootfile attribute: {err}"))?;
                if let Some(attr) = attr {
                    let value = attr
                        .unescape_value()
                        .map_err(|err| format!("invalid rootfile path: {err}"))?;
                    return Ok(value.into_owned());
                }
            }
            Ok(Event::Eof) => return Err("container.xml has no rootfile".to_string()),
            Err(err) => return Err(format!("invalid container.xml: {err}")),
            _ => {}
        }
    }
}

#[cfg_attr(not(feature = "epub"), allow(dead_code))]
#[derive(Debug, Default, PartialEq)]
struct Package {
    metadata: std::collections::BTreeMap<String, String>,
    /// Manifest hrefs in spine order.
    spine: Vec<String>,
}

#[cfg(feature = "epub")]
fn parse_package(opf_xml: &str) -> Result<Package, String> {
    use quick_xml::events::{BytesStart, Event};
    use quick_xml::Reader;
    use std::collections::HashMap;

    fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
        e.try_get_attribute(name)
            .ok()
            .flatten()
            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
    }

    let mut reader = Reader::from_str(opf_xml);
    reader.trim_text(true);

    let mut package = Package::default();
    let mut items: HashMap<String, String> = HashMap::new();
    let mut idrefs: Vec<String> = Vec::new();
    let mut meta_field: Option<&'static str> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"item" => {
                    if let (Some(id), Some(href)) = (attr(&e, "id"), attr(&e, "href")) {
                        items.insert(id, href);
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attr(&e, "idref") {
                        idrefs.push(idref);
                    }
                }
                b"title" => meta_field = Some("title"),
                b"creator" => meta_field = Some("author"),
                b"language" => meta_field = Some("language"),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(field) = meta_field {
                    let value = t
                        .unescape()
                        .map_err(|err| format!("invalid package text: {err}"))?;
                    package
                        .metadata
                        .entry(field.to_string())
                        .or_insert_with(|| value.trim().to_string());
                }
            }
            Ok(Event::End(_)) => meta_field = None,
            Ok(Event::Eof) => break,
            Err(err) => return Err(format!("invalid package document: {err}")),
            _ => {}
        }
    }

    for idref in idrefs {
        match items.get(&idref) {
            Some(href) => package.spine.push(href.clone()),
            None => tracing::debug!(idref = %idref, "spine item missing from manifest"),
        }
    }
    Ok(package)
}

/// Zip entry name for `href`, which is relative to the OPF document.
#[cfg_attr(not(feature = "epub"), allow(dead_code))]
fn resolve_href(opf_path: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = match opf_path.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|p| !p.is_empty()).collect(),
        None => Vec::new(),
    };
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Visible text of an XHTML chapter, one line per text node.
#[cfg(feature = "epub")]
fn xhtml_text(html: &str) -> String {
    use scraper::{Html, Selector};

    let doc = Html::parse_document(html);
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = doc.select(&selector).next() else {
        return String::new();
    };

    let mut out = String::new();
    for t in body.text() {
        let s = t.trim();
        if s.is_empty() {
            continue;
        }
        out.push_str(s);
        out.push('\n');
    }
    out
}
