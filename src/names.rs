//! Author name tagging.
//!
//! Converts a `(first, last)` name pair into a canonical tag of the form
//! `author.<Initial>-<Last>` and records every spelling observed for that tag
//! in an [`AuthorRegistry`], which the vault generator owns for one run.

use std::collections::HashMap;

use crate::normalize::{capitalize, tagify, to_alpha};

/// Prefix shared by every author tag.
pub const AUTHOR_TAG_PREFIX: &str = "author.";

/// Characters trimmed from each name part before it is reduced to letters.
const NAME_TRIM_CHARS: &[char] = &['_', '-', ',', '.', '}', '{'];

/// Distinct display spellings per author tag, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct AuthorRegistry {
    spellings: HashMap<String, Vec<String>>,
}

impl AuthorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a spelling under `tag`, ignoring exact duplicates.
    pub fn record(&mut self, tag: &str, spelling: &str) {
        let names = self.spellings.entry(tag.to_string()).or_default();
        if !names.iter().any(|n| n == spelling) {
            names.push(spelling.to_string());
        }
    }

    /// All spellings recorded for a full tag such as `author.J-Doe`.
    pub fn spellings(&self, tag: &str) -> &[String] {
        self.spellings.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.spellings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spellings.is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.spellings.clear();
    }
}

/// Returns true for a tag with nothing after the author prefix.
///
/// Produced when both name parts reduce to nothing; such tags are kept on the
/// entry so authors and tags stay aligned, but never get a tag note.
pub fn is_blank_author_tag(tag: &str) -> bool {
    tag.strip_prefix(AUTHOR_TAG_PREFIX)
        .is_some_and(|rest| rest.is_empty())
}

/// Build the author tag for a `(first, last)` pair and record its spelling.
///
/// When `first` is blank and `last` holds several words, `last` is treated as
/// a complete "First ... Last" name and its first and final words are used.
pub fn name_to_tag(
    first: &str,
    last: &str,
    kebab_case: bool,
    registry: &mut AuthorRegistry,
) -> String {
    if first.trim().is_empty() {
        let words: Vec<&str> = last
            .trim_matches(|c: char| matches!(c, '}' | '{') || c.is_whitespace())
            .split_whitespace()
            .collect();
        if words.len() > 1 {
            return name_to_tag(words[0], words[words.len() - 1], kebab_case, registry);
        }
    }

    let first_part = capitalize(&name_part(first, kebab_case));
    let last_part = capitalize(&name_part(last, kebab_case));

    let short = match (first_part.chars().next(), last_part.is_empty()) {
        (None, _) => last_part,
        (Some(_), true) => first_part,
        (Some(initial), false) => format!("{}-{}", initial, last_part),
    };

    let tag = format!("{}{}", AUTHOR_TAG_PREFIX, short);
    if !short.is_empty() {
        registry.record(&tag, &format!("{} {}", first, last));
    }
    tag
}

fn name_part(name: &str, kebab_case: bool) -> String {
    to_alpha(tagify(name, kebab_case).trim().trim_matches(NAME_TRIM_CHARS)).to_lowercase()
}
