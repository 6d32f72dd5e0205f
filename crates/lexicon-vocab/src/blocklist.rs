//! Franchise-organized blocklist of IP-encumbered terms.
//!
//! File format (franchise order is significant: the first match wins):
//!
//! ```json
//! {
//!   "dnd": ["beholder", "mind flayer", "illithid"],
//!   "warhammer": ["space marine"]
//! }
//! ```

use crate::error::BlocklistError;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
struct Franchise {
    name: String,
    /// Lowercased terms for exact lookups.
    terms: HashSet<String>,
    /// Word-bounded alternation over all terms; `None` for an empty list.
    pattern: Option<Regex>,
}

#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    franchises: Vec<Franchise>,
}

/// Franchise → terms in declaration order.
struct OrderedFranchises(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for OrderedFranchises {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedFranchises;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of franchise name to a list of terms")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::new();
                while let Some((name, terms)) = access.next_entry::<String, Vec<String>>()? {
                    out.push((name, terms));
                }
                Ok(OrderedFranchises(out))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

impl Blocklist {
    pub fn load(path: &Path) -> Result<Self, BlocklistError> {
        let contents = fs::read_to_string(path).map_err(|source| BlocklistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ordered: OrderedFranchises =
            serde_json::from_str(&contents).map_err(|source| BlocklistError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let blocklist = Self::from_franchises(ordered.0)?;
        tracing::debug!(
            path = %path.display(),
            franchises = blocklist.franchises.len(),
            "loaded IP blocklist"
        );
        Ok(blocklist)
    }

    /// Build from `(franchise, terms)` pairs; franchise order is preserved.
    pub fn from_franchises<I, S, T>(franchises: I) -> Result<Self, BlocklistError>
    where
        I: IntoIterator<Item = (S, Vec<T>)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for (name, raw_terms) in franchises {
            let name = name.into();
            let terms: HashSet<String> = raw_terms
                .iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();

            let pattern = if terms.is_empty() {
                None
            } else {
                // Longest first so overlapping phrases prefer the fuller match.
                let mut alternatives: Vec<&String> = terms.iter().collect();
                alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
                let body = alternatives
                    .iter()
                    .map(|t| regex::escape(t))
                    .collect::<Vec<_>>()
                    .join("|");
                let regex = Regex::new(&format!(r"(?i)\b(?:{body})\b")).map_err(|source| {
                    BlocklistError::Pattern {
                        franchise: name.clone(),
                        source,
                    }
                })?;
                Some(regex)
            };

            compiled.push(Franchise {
                name,
                terms,
                pattern,
            });
        }
        Ok(Self {
            franchises: compiled,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.franchises.iter().all(|f| f.terms.is_empty())
    }

    pub fn franchise_names(&self) -> impl Iterator<Item = &str> {
        self.franchises.iter().map(|f| f.name.as_str())
    }

    /// First franchise whose terms match `text` or `canonical`, either exactly
    /// or as a whole word/phrase inside the longer string. Case-insensitive.
    pub fn check(&self, text: &str, canonical: &str) -> Option<&str> {
        let text_lower = text.to_lowercase();
        let canonical_lower = canonical.to_lowercase();

        self.franchises
            .iter()
            .find(|franchise| {
                franchise.terms.contains(text_lower.trim())
                    || franchise.terms.contains(canonical_lower.trim())
                    || franchise.pattern.as_ref().is_some_and(|re| {
                        re.is_match(&text_lower) || re.is_match(&canonical_lower)
                    })
            })
            .map(|franchise| franchise.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Blocklist {
        Blocklist::from_franchises(vec![
            ("dnd", vec!["beholder", "Mind Flayer", "sword"]),
            ("lotr", vec!["hobbit", "mind flayer"]),
        ])
        .unwrap()
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let list = sample();
        assert_eq!(list.check("Mind Flayer", "mind flayer"), Some("dnd"));
        assert_eq!(list.check("BEHOLDER", "beholders"), Some("dnd"));
    }

    #[test]
    fn phrase_matches_inside_longer_text() {
        let list = sample();
        assert_eq!(list.check("elder hobbit chief", "elder hobbit chief"), Some("lotr"));
    }

    #[test]
    fn word_boundaries_are_respected() {
        let list = sample();
        assert_eq!(list.check("swordsman", "swordsman"), None);
        assert_eq!(list.check("flaming sword", "flaming sword"), Some("dnd"));
    }

    #[test]
    fn declaration_order_decides_between_franchises() {
        let list = sample();
        assert_eq!(list.check("mind flayer", "mind flayer"), Some("dnd"));
        let names: Vec<&str> = list.franchise_names().collect();
        assert_eq!(names, vec!["dnd", "lotr"]);
    }

    #[test]
    fn load_preserves_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocklist.json");
        fs::write(&path, r#"{"zeta": ["shared"], "alpha": ["shared"]}"#).unwrap();

        let list = Blocklist::load(&path).unwrap();
        assert_eq!(list.check("shared", "shared"), Some("zeta"));
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let list = Blocklist::from_franchises(vec![("misc", vec!["c++ golem"])]).unwrap();
        assert_eq!(list.check("c++ golem", "c++ golem"), Some("misc"));
        assert_eq!(list.check("cc golem", "cc golem"), None);
    }
}
