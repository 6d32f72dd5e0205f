//! IP flag detection.
//!
//! A flag is a `;`-joined list of `source:detail` parts, for example
//! `blocklist:dnd;classification:named character`. Blocklist parts always
//! come first. Running detection again over an already-flagged entry yields
//! the same flag.

use crate::blocklist::Blocklist;
use crate::entry::VocabularyEntry;

pub const BLOCKLIST_PREFIX: &str = "blocklist:";
pub const CLASSIFICATION_PREFIX: &str = "classification:";
pub const FLAG_SEPARATOR: char = ';';

/// Blocklist part for `entry`, if any franchise matches its text or canonical form.
pub fn blocklist_flag(entry: &VocabularyEntry, blocklist: &Blocklist) -> Option<String> {
    blocklist
        .check(&entry.text, &entry.canonical)
        .map(|franchise| format!("{BLOCKLIST_PREFIX}{franchise}"))
}

/// Combine a blocklist match with whatever flag the entry already carries.
///
/// Free-text reasons from classification are wrapped as
/// `classification:<reason>`. Returns `None` when there is nothing to report.
pub fn detect_ip(entry: &VocabularyEntry, blocklist: Option<&Blocklist>) -> Option<String> {
    let mut blocklist_parts: Vec<String> = Vec::new();
    let mut classification_parts: Vec<String> = Vec::new();

    if let Some(part) = blocklist.and_then(|list| blocklist_flag(entry, list)) {
        blocklist_parts.push(part);
    }

    let prior = entry.ip_flag.as_deref().unwrap_or_default();
    for part in prior.split(FLAG_SEPARATOR).map(str::trim).filter(|p| !p.is_empty()) {
        if part.starts_with(BLOCKLIST_PREFIX) {
            push_unique(&mut blocklist_parts, part.to_string());
        } else if part.starts_with(CLASSIFICATION_PREFIX) {
            push_unique(&mut classification_parts, part.to_string());
        } else {
            push_unique(
                &mut classification_parts,
                format!("{CLASSIFICATION_PREFIX}{part}"),
            );
        }
    }

    if blocklist_parts.is_empty() && classification_parts.is_empty() {
        return None;
    }
    blocklist_parts.extend(classification_parts);
    Some(blocklist_parts.join(&FLAG_SEPARATOR.to_string()))
}

fn push_unique(parts: &mut Vec<String>, part: String) {
    if !parts.contains(&part) {
        parts.push(part);
    }
}

/// Apply [`detect_ip`] to every entry, returning new entries.
///
/// Entries with no detection result are passed through unchanged.
pub fn flag_terms(entries: &[VocabularyEntry], blocklist: Option<&Blocklist>) -> Vec<VocabularyEntry> {
    entries
        .iter()
        .map(|entry| match detect_ip(entry, blocklist) {
            Some(flag) => entry.clone().with_ip_flag(Some(flag)),
            None => entry.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::entry;

    fn blocklist() -> Blocklist {
        Blocklist::from_franchises(vec![("dnd", vec!["beholder", "mind flayer"])]).unwrap()
    }

    #[test]
    fn no_match_and_no_prior_flag_is_none() {
        let e = entry("fireball", "phb", 0.9);
        assert_eq!(detect_ip(&e, Some(&blocklist())), None);
        assert_eq!(detect_ip(&e, None), None);
    }

    #[test]
    fn empty_prior_flag_counts_as_absent() {
        let e = entry("fireball", "phb", 0.9).with_ip_flag(Some(String::new()));
        assert_eq!(detect_ip(&e, None), None);
    }

    #[test]
    fn blocklist_match_alone() {
        let mut e = entry("mind flayer", "mm", 0.9);
        e.text = "Mind Flayer".into();
        assert_eq!(detect_ip(&e, Some(&blocklist())).as_deref(), Some("blocklist:dnd"));
    }

    #[test]
    fn classification_reason_is_prefixed() {
        let e = entry("drizzt", "novel", 0.9).with_ip_flag(Some("named character".into()));
        assert_eq!(
            detect_ip(&e, None).as_deref(),
            Some("classification:named character")
        );
    }

    #[test]
    fn both_sources_join_with_blocklist_first() {
        let e = entry("beholder", "mm", 0.9).with_ip_flag(Some("trademarked monster".into()));
        assert_eq!(
            detect_ip(&e, Some(&blocklist())).as_deref(),
            Some("blocklist:dnd;classification:trademarked monster")
        );
    }

    #[test]
    fn detection_is_idempotent() {
        let list = blocklist();
        let e = entry("beholder", "mm", 0.9).with_ip_flag(Some("trademarked monster".into()));
        let once = detect_ip(&e, Some(&list));
        let again = detect_ip(&e.clone().with_ip_flag(once.clone()), Some(&list));
        assert_eq!(once, again);
    }

    #[test]
    fn flag_terms_does_not_touch_inputs() {
        let inputs = vec![entry("beholder", "mm", 0.9), entry("fireball", "phb", 0.9)];
        let flagged = flag_terms(&inputs, Some(&blocklist()));

        assert!(inputs.iter().all(|e| e.ip_flag.is_none()));
        assert_eq!(flagged[0].ip_flag.as_deref(), Some("blocklist:dnd"));
        assert_eq!(flagged[1], inputs[1]);
    }
}
