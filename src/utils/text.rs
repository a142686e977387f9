// src/utils/text.rs

//! Text normalization helpers shared by the listing and detail extractors.

use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length in user-perceived characters.
pub fn char_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// First `max` user-perceived characters of `s`, for log previews.
pub fn preview(s: &str, max: usize) -> String {
    let mut out: String = s.graphemes(true).take(max).collect();
    if char_len(s) > max {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

/// Cap `s` at `max` Unicode scalar values, ending with `...` when cut.
///
/// For transport limits, which count scalars rather than graphemes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max {
        return s;
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Substitute `{name}` placeholders in a message template.
///
/// Unknown placeholders are left untouched.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}
