//! Term classification.
//!
//! The batch pipeline only sees [`TermClassifier`]. The Anthropic-backed
//! implementation sends one Messages API request per term and expects a
//! single JSON object back. Rate limiting and retry are left to the caller.

use crate::error::ClassifyError;
use crate::extract::CandidateTerm;
use lexicon_vocab::VocabularyEntry;
use serde_json::Value;
use std::time::Duration;

pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const MODEL_ENV: &str = "LEXICON_MODEL";
pub const API_BASE_ENV: &str = "LEXICON_API_BASE";
pub const TIMEOUT_ENV: &str = "LEXICON_TIMEOUT_SECS";

const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
#[cfg_attr(not(feature = "anthropic"), allow(dead_code))]
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub trait TermClassifier: Send + Sync {
    /// Classify one candidate found in the document identified by `source`.
    ///
    /// The returned entry's `source` is always `source`.
    fn classify(
        &self,
        candidate: &CandidateTerm,
        source: &str,
    ) -> Result<VocabularyEntry, ClassifyError>;
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ClassifierConfig {
    /// Read configuration from the environment.
    ///
    /// `ANTHROPIC_API_KEY` is required; `LEXICON_MODEL`, `LEXICON_API_BASE`
    /// and `LEXICON_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> Result<Self, ClassifyError> {
        let api_key = std::env::var(ANTHROPIC_API_KEY_ENV).unwrap_or_default();
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(ClassifyError::NotConfigured(format!(
                "{ANTHROPIC_API_KEY_ENV} is not set"
            )));
        }

        let model = env_or(MODEL_ENV, DEFAULT_MODEL);
        let base_url = env_or(API_BASE_ENV, DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = match std::env::var(TIMEOUT_ENV) {
            Ok(v) if !v.trim().is_empty() => v.trim().parse::<u64>().map_err(|_| {
                ClassifyError::NotConfigured(format!(
                    "invalid {TIMEOUT_ENV}={v:?} (expected whole seconds)"
                ))
            })?,
            _ => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

pub const SYSTEM_PROMPT: &str = r#"You classify fantasy vocabulary for game content generation.

Return ONE JSON object with these fields and nothing else (no markdown):
- id: "<source>-<term>" lowercase and hyphenated
- text: display text, original capitalization
- genre: "fantasy"
- intent: offensive | defensive | utility | summoning | transformation | divination | enchantment | necromancy | control
- pos: noun | verb | adjective | phrase
- axes: object of axis scores in [0, 1]; include only non-zero axes.
  Elemental: fire water earth air light shadow life void
  Mechanical: force binding ward sight mind time space fate
  Most terms have two to four strong axes.
- tags: two to five short descriptive tags
- category: spell | creature | item | location | character | material | concept | action
- canonical: lowercase singular base form
- mood: arcane | dark | heroic | primal | divine | eldritch | whimsical | martial
- energy: damage/energy type or ""
- confidence: 0..1; below 0.3 for terms that are not fantasy-relevant
- secondary_intents: other intents that also apply
- ip_flag: omit, unless the term is a proprietary name from a known franchise; then a short reason"#;

/// User message for a single candidate.
pub fn build_user_prompt(candidate: &CandidateTerm) -> String {
    let mut parts = vec![format!("Classify this fantasy term: '{}'", candidate.text)];
    if candidate.lemma != candidate.text.to_lowercase() {
        parts.push(format!("Lemma: {}", candidate.lemma));
    }
    parts.push(format!("POS: {}", candidate.pos.as_str()));
    parts.join("\n")
}

/// Lowercase ASCII slug: runs of anything else become a single `-`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// First balanced `{...}` in `text`, ignoring braces inside strings.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i64;
    let mut in_string = false;
    let mut escape = false;
    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escape => escape = false,
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + idx + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turn a model response into an entry for `candidate` found in `source`.
///
/// Missing `text`, `canonical`, `pos` and `id` are filled from the candidate;
/// `source` is always overwritten.
pub fn parse_classification(
    response: &str,
    candidate: &CandidateTerm,
    source: &str,
) -> Result<VocabularyEntry, ClassifyError> {
    let invalid = |reason: String| ClassifyError::InvalidResponse {
        term: candidate.text.clone(),
        reason,
    };

    let json = extract_json_object(response).ok_or_else(|| invalid("no JSON object".into()))?;
    let mut value: Value = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| invalid("expected a JSON object".into()))?;

    obj.insert("source".into(), Value::String(source.to_string()));
    let missing = |v: Option<&Value>| v.and_then(Value::as_str).map_or(true, |s| s.trim().is_empty());
    if missing(obj.get("text")) {
        obj.insert("text".into(), Value::String(candidate.text.clone()));
    }
    if missing(obj.get("canonical")) {
        obj.insert("canonical".into(), Value::String(candidate.lemma.clone()));
    }
    if missing(obj.get("pos")) {
        obj.insert("pos".into(), Value::String(candidate.pos.as_str().to_string()));
    }
    if missing(obj.get("id")) {
        let canonical = obj.get("canonical").and_then(Value::as_str).unwrap_or_default();
        let id = format!("{}-{}", slugify(source), slugify(canonical));
        obj.insert("id".into(), Value::String(id));
    }
    if obj.get("ip_flag").is_some_and(|v| v.as_str().is_some_and(|s| s.trim().is_empty())) {
        obj.insert("ip_flag".into(), Value::Null);
    }

    let entry: VocabularyEntry = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
    entry.validate().map_err(|e| invalid(e.to_string()))?;
    Ok(entry)
}

#[cfg(feature = "anthropic")]
pub struct AnthropicClassifier {
    config: ClassifierConfig,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "anthropic")]
impl AnthropicClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassifyError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { config, client })
    }

    fn messages(&self, user: &str) -> Result<String, ClassifyError> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": SYSTEM_PROMPT,
            "messages": [{ "role": "user", "content": user }]
        });

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .map_err(|e| ClassifyError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let v: Value = resp
            .json()
            .map_err(|e| ClassifyError::Network(format!("invalid response body: {e}")))?;
        response_text(&v).ok_or_else(|| ClassifyError::Api {
            status: status.as_u16(),
            body: "no text blocks in response".to_string(),
        })
    }
}

#[cfg(feature = "anthropic")]
impl TermClassifier for AnthropicClassifier {
    fn classify(
        &self,
        candidate: &CandidateTerm,
        source: &str,
    ) -> Result<VocabularyEntry, ClassifyError> {
        let text = self.messages(&build_user_prompt(candidate))?;
        parse_classification(&text, candidate, source)
    }
}

/// Concatenated `text` content blocks of a Messages API response.
#[cfg_attr(not(feature = "anthropic"), allow(dead_code))]
fn response_text(v: &Value) -> Option<String> {
    let blocks = v.get("content")?.as_array()?;
    let text = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The configured remote classifier, or `NotConfigured` when support is not compiled in.
pub fn anthropic_classifier(
    config: ClassifierConfig,
) -> Result<Box<dyn TermClassifier>, ClassifyError> {
    #[cfg(feature = "anthropic")]
    {
        Ok(Box::new(AnthropicClassifier::new(config)?))
    }
    #[cfg(not(feature = "anthropic"))]
    {
        let _ = config;
        Err(ClassifyError::NotConfigured(
            "anthropic support not compiled. Rebuild with --features anthropic".to_string(),
        ))
    }
}
