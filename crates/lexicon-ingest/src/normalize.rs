//! Text cleanup applied to everything a document parser yields.

use unicode_normalization::UnicodeNormalization;

/// Normalize extracted text.
///
/// NFKC (so ligatures like `ﬁ` become `fi`), `\n` line endings, runs of
/// horizontal whitespace collapsed to one space, lines trimmed, at most one
/// blank line in a row, and no leading or trailing blank lines.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfkc().collect();
    let unified = composed.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&collapsed);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ligatures_are_decomposed() {
        assert_eq!(normalize_text("the \u{FB01}ery dragon"), "the fiery dragon");
    }

    #[test]
    fn whitespace_is_collapsed_per_line() {
        let raw = "  Spell\tof   binding  \r\nsecond\rthird  ";
        assert_eq!(normalize_text(raw), "Spell of binding\nsecond\nthird");
    }

    #[test]
    fn blank_lines_are_limited() {
        let raw = "\n\nChapter One\n\n\n\n   \nThe wyrm woke.\n\n";
        assert_eq!(normalize_text(raw), "Chapter One\n\nThe wyrm woke.");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_text(" \n\t\n"), "");
    }
}
