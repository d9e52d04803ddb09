//! Bibliography loading.
//!
//! [`parser`] turns BibTeX text into entries whose citation keys are
//! lower-cased. [`load_bibliography`] then re-scans the literal source lines
//! to recover the original key casing, which becomes the note filename stem.
//! The two views must agree on the number of entries.

pub mod names;
pub mod parser;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub use names::{Name, NameError, parse_names};

use crate::{Error, Result};

/// Entry types recognized when re-scanning the source for citation keys.
pub const ENTRY_TYPES: [&str; 16] = [
    "article",
    "book",
    "booklet",
    "conference",
    "inbook",
    "incollection",
    "inproceedings",
    "manual",
    "masterthesis",
    "misc",
    "phdthesis",
    "proceedings",
    "techreport",
    "unpublished",
    "online",
    "software",
];

static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)^@(?:{})\{{([^,}}]*)", ENTRY_TYPES.join("|"));
    Regex::new(&pattern).expect("entry line pattern is valid")
});

/// Insertion-ordered field mapping with case-insensitive lookup.
///
/// Names are stored lower-cased by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field; a replaced field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First present field among `names`, tried in order.
    pub fn get_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One bibliography record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    /// Lower-cased entry type (`article`, `book`, ...)
    pub entry_type: String,
    /// Citation key
    pub key: String,
    pub fields: FieldMap,
}

impl BibEntry {
    /// Parse the `author` field into names. A missing field yields no names.
    pub fn authors(&self) -> std::result::Result<Vec<Name>, NameError> {
        match self.fields.get("author") {
            Some(field) => parse_names(field),
            None => Ok(Vec::new()),
        }
    }
}

/// Entries of a bibliography keyed by their source-cased citation keys.
#[derive(Debug, Clone, Default)]
pub struct Bibliography {
    entries: Vec<BibEntry>,
}

impl Bibliography {
    pub fn entries(&self) -> &[BibEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Bibliography {
    type Item = BibEntry;
    type IntoIter = std::vec::IntoIter<BibEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Read and parse a bibliography file.
pub fn load_bibliography(path: &Path) -> Result<Bibliography> {
    let src = std::fs::read_to_string(path)?;
    parse_bibliography(&src)
}

/// Parse bibliography text, restoring citation key case from the source.
pub fn parse_bibliography(src: &str) -> Result<Bibliography> {
    let parsed = parser::parse(src)?;
    let scanned = scan_keys(src);

    if scanned.len() != parsed.len() {
        return Err(Error::KeyMismatch {
            scanned: scanned.len(),
            parsed: parsed.len(),
        });
    }

    let mut remaining: Vec<Option<BibEntry>> = parsed.into_iter().map(Some).collect();
    let mut entries = Vec::with_capacity(scanned.len());
    for key in scanned {
        let lower = key.to_lowercase();
        let mut entry = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|e| e.key == lower))
            .and_then(Option::take)
            .ok_or_else(|| Error::MissingKey(lower.clone()))?;
        entry.key = key;
        entries.push(entry);
    }

    Ok(Bibliography { entries })
}

/// Citation keys as written in the source, from lines that start an entry of
/// a known type.
pub fn scan_keys(src: &str) -> Vec<String> {
    src.lines()
        .filter_map(|line| ENTRY_LINE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .collect()
}
