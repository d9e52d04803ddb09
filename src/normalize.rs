//! String cleanup for BibTeX field values and tag identifiers.
//!
//! All functions here are pure and infallible. Non-ASCII text is folded by
//! decomposing it (NFKD) and dropping whatever does not survive as ASCII, so
//! `Müller` becomes `Muller` rather than disappearing.

use unicode_normalization::UnicodeNormalization;

/// Decompose to NFKD and drop every non-ASCII codepoint.
pub fn fold_ascii(s: &str) -> String {
    s.nfkd().filter(char::is_ascii).collect()
}

/// Strip BibTeX formatting from a field value.
///
/// Removes braces, turns newlines and tabs into double spaces, drops carriage
/// returns, trims, and removes trailing commas.
pub fn strip_format(s: &str) -> String {
    fold_ascii(s)
        .replace(['{', '}'], "")
        .replace('\n', "  ")
        .replace('\r', "")
        .replace('\t', "  ")
        .trim()
        .trim_end_matches(',')
        .to_string()
}

/// Convert arbitrary text into a tag-safe identifier.
///
/// With `kebab_case` set, underscores become hyphens and the result is
/// lower-cased. Dots are always replaced by hyphens since they separate
/// hierarchy levels in note names.
pub fn tagify(s: &str, kebab_case: bool) -> String {
    let mut out = fold_ascii(s)
        .replace(" - ", "-")
        .replace(' ', "_")
        .replace('\t', "__")
        .replace('\\', "")
        .replace('\n', "")
        .replace('/', "-");

    if kebab_case {
        out = out.replace('_', "-").to_lowercase();
    }

    out.replace('.', "-")
}

/// Keep only alphabetic characters.
pub fn to_alpha(s: &str) -> String {
    s.chars().filter(|c| c.is_alphabetic()).collect()
}

/// Upper-case the first character, leaving the rest untouched.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_format_removes_braces_and_whitespace() {
        assert_eq!(strip_format("  {Deep} {L}earning,\n"), "Deep Learning");
        assert_eq!(strip_format("a\nb\tc\r"), "a  b  c");
    }

    #[test]
    fn test_strip_format_folds_unicode() {
        assert_eq!(strip_format("Schr\u{f6}dinger"), "Schrodinger");
        assert_eq!(strip_format("\u{65e5}\u{672c}"), "");
    }

    #[test]
    fn test_strip_format_trailing_commas_only() {
        assert_eq!(strip_format(",a,b,,"), ",a,b");
    }

    #[test]
    fn test_tagify_default() {
        assert_eq!(tagify("Machine Learning", false), "Machine_Learning");
        assert_eq!(tagify("nlp", false), "nlp");
        assert_eq!(tagify("input/output", false), "input-output");
        assert_eq!(tagify("Self - Attention", false), "Self-Attention");
        assert_eq!(tagify("v1.2", false), "v1-2");
        assert_eq!(tagify("a\tb", false), "a__b");
        assert_eq!(tagify("back\\slash", false), "backslash");
    }

    #[test]
    fn test_tagify_kebab_case() {
        assert_eq!(tagify("Machine Learning", true), "machine-learning");
        assert_eq!(tagify("Snake_Case.Tag", true), "snake-case-tag");
    }

    #[test]
    fn test_to_alpha() {
        assert_eq!(to_alpha("O'Brien-2"), "OBrien");
        assert_eq!(to_alpha(""), "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("doe"), "Doe");
        assert_eq!(capitalize(""), "");
    }
}
