//! Candidate term extraction.

use crate::filter::TermFilter;
use lexicon_vocab::PartOfSpeech;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A term worth sending to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTerm {
    /// As it appears in the source.
    pub text: String,
    /// Lowercased form used for deduplication.
    pub lemma: String,
    pub pos: PartOfSpeech,
    /// Byte offsets `[start, end)` into the extracted text.
    pub span: (usize, usize),
}

pub trait TermExtractor: Send + Sync {
    /// Candidates in `text`, deduplicated by lemma.
    fn extract(&self, text: &str) -> Vec<CandidateTerm>;
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

impl Token<'_> {
    fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Words made of letters, with inner apostrophes or hyphens (`dragon's`, `half-elf`).
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if !c.is_alphabetic() {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if next.is_alphanumeric() {
                end = idx + next.len_utf8();
                chars.next();
                continue;
            }
            if matches!(next, '\'' | '’' | '-') {
                let after = text[idx + next.len_utf8()..].chars().next();
                if after.is_some_and(char::is_alphabetic) {
                    end = idx + next.len_utf8();
                    chars.next();
                    continue;
                }
            }
            break;
        }
        tokens.push(Token {
            text: &text[start..end],
            start,
            end,
        });
    }
    tokens
}

fn lemma_of(word: &str) -> String {
    let lower = word.to_lowercase();
    for suffix in ["'s", "’s"] {
        if let Some(stripped) = lower.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    lower
}

/// Dictionary-free extractor.
///
/// Every word that survives the [`TermFilter`] is a noun candidate, and runs
/// of two or three capitalized content words separated by single spaces
/// (`Mind Flayer`) become phrase candidates.
#[derive(Debug, Clone, Default)]
pub struct HeuristicExtractor {
    filter: TermFilter,
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn phrase_runs<'a>(&self, text: &str, tokens: &[Token<'a>]) -> Vec<Vec<Token<'a>>> {
        let mut runs = Vec::new();
        let mut current: Vec<Token<'a>> = Vec::new();
        for token in tokens {
            let is_content = token.is_capitalized() && !self.filter.is_function_word(token.text);
            let adjacent = current
                .last()
                .is_some_and(|prev| &text[prev.end..token.start] == " ");
            if is_content && (current.is_empty() || adjacent) {
                current.push(*token);
                continue;
            }
            runs.push(std::mem::take(&mut current));
            if is_content {
                current.push(*token);
            }
        }
        runs.push(current);
        runs.retain(|run| (2..=3).contains(&run.len()));
        runs
    }
}

impl TermExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Vec<CandidateTerm> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let tokens = tokenize(text);
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for token in &tokens {
            let lemma = lemma_of(token.text);
            if !self.filter.should_keep(&lemma) || !seen.insert(lemma.clone()) {
                continue;
            }
            out.push(CandidateTerm {
                text: token.text.to_string(),
                lemma,
                pos: PartOfSpeech::Noun,
                span: (token.start, token.end),
            });
        }

        for run in self.phrase_runs(text, &tokens) {
            let (Some(first), Some(last)) = (run.first(), run.last()) else {
                continue;
            };
            let lemma = run
                .iter()
                .map(|t| lemma_of(t.text))
                .collect::<Vec<_>>()
                .join(" ");
            if !self.filter.should_keep(&lemma) || !seen.insert(lemma.clone()) {
                continue;
            }
            out.push(CandidateTerm {
                text: text[first.start..last.end].to_string(),
                lemma,
                pos: PartOfSpeech::Phrase,
                span: (first.start, last.end),
            });
        }

        tracing::debug!(candidates = out.len(), "extracted candidate terms");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemmas(candidates: &[CandidateTerm]) -> Vec<&str> {
        candidates.iter().map(|c| c.lemma.as_str()).collect()
    }

    #[test]
    fn words_are_filtered_and_deduplicated() {
        let text = "The wyvern and the Wyvern saw 42 ox at dusk.";
        let candidates = HeuristicExtractor::new().extract(text);
        assert_eq!(lemmas(&candidates), vec!["wyvern", "saw", "dusk"]);
        assert_eq!(candidates[0].span, (4, 10));
        assert_eq!(&text[candidates[0].span.0..candidates[0].span.1], "wyvern");
    }

    #[test]
    fn capitalized_runs_become_phrases() {
        let text = "A Mind Flayer lurks. Ancient Silver Dragon Lord waits.";
        let candidates = HeuristicExtractor::new().extract(text);
        let phrase: Vec<&CandidateTerm> = candidates
            .iter()
            .filter(|c| c.pos == PartOfSpeech::Phrase)
            .collect();
        assert_eq!(phrase.len(), 1);
        assert_eq!(phrase[0].text, "Mind Flayer");
        assert_eq!(phrase[0].lemma, "mind flayer");
    }

    #[test]
    fn possessives_and_hyphens() {
        let candidates = HeuristicExtractor::new().extract("The lich's half-elf thrall");
        assert_eq!(lemmas(&candidates), vec!["lich", "half-elf", "thrall"]);
    }

    #[test]
    fn empty_text_has_no_candidates() {
        assert!(HeuristicExtractor::new().extract("  \n ").is_empty());
    }
}
