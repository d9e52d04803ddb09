//! Markdown notes with YAML front matter.
//!
//! A note file looks like:
//!
//! ```text
//! ---
//! title: A Study
//! id: 3fQ0aZ...
//! created: 1700000000000
//! updated: 1700000000000
//! ---
//! # Body
//! ```
//!
//! Front-matter keys are written in [`DEFAULT_KEY_ORDER`] first, then any
//! other keys in the order they were inserted, so loading and dumping a note
//! reproduces its key ordering exactly.

pub mod frontmatter;

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_yaml::{Mapping, Value};

use crate::{Error, Result};

/// Line separating the front matter from the body.
pub const DEFAULT_DELIMITER: &str = "---";

/// Preferred order of front-matter keys.
pub const DEFAULT_KEY_ORDER: [&str; 8] = [
    "title",
    "desc",
    "id",
    "created",
    "updated",
    "bibliography",
    "__defaults__",
    "traitIds",
];

/// Length of generated note ids.
pub const NOTE_ID_LEN: usize = 21;

/// Generate a note id: 21 characters drawn uniformly from `[A-Za-z0-9]`.
///
/// No collision check is made. With 62^21 (about 4.4e37) possible ids, the
/// chance of any collision in a vault of a million notes is around 1e-26.
pub fn generate_note_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NOTE_ID_LEN)
        .map(char::from)
        .collect()
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A note: ordered front matter plus a free-text body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDocument {
    pub front_matter: Mapping,
    pub body: String,
}

impl NoteDocument {
    /// Create an empty note.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a note from `front_matter` with `created` and `updated` set to
    /// now, and optionally a fresh `id`.
    pub fn with_defaults(front_matter: Mapping, generate_id: bool) -> Self {
        let mut note = Self {
            front_matter,
            body: String::new(),
        };
        let now = now_millis();
        note.set("created", now);
        note.set("updated", now);
        if generate_id {
            note.set("id", generate_note_id());
        }
        note
    }

    /// Load a note from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|message| Error::FrontMatter {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse note text using the default delimiter.
    ///
    /// The text before the first delimiter line must be blank, and a second
    /// delimiter line must close the front matter. Everything after the
    /// closing delimiter is the body.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut delimiters = Vec::with_capacity(2);
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            if line.trim_end() == DEFAULT_DELIMITER {
                delimiters.push((offset, offset + line.len()));
                if delimiters.len() == 2 {
                    break;
                }
            }
            offset += line.len();
        }

        let [(open_start, open_end), (close_start, close_end)] = delimiters[..] else {
            return Err("missing sections, check delimiters".to_string());
        };

        let preamble = &text[..open_start];
        if !preamble.trim().is_empty() {
            return Err(format!(
                "file does not start with front matter, found: {}",
                preamble.trim()
            ));
        }

        let front_matter = parse_front_matter(&text[open_end..close_start])?;
        Ok(Self {
            front_matter,
            body: text[close_end..].to_string(),
        })
    }

    /// Serialize the note with front-matter keys in the preferred order.
    pub fn dump(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.ordered_front_matter())?;
        Ok([
            DEFAULT_DELIMITER,
            yaml.trim(),
            DEFAULT_DELIMITER,
            self.body.trim_start(),
        ]
        .join("\n"))
    }

    /// Write the note to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.dump()?)?;
        Ok(())
    }

    /// Set `updated` to the current time.
    pub fn update_timestamp(&mut self) {
        self.set("updated", now_millis());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.front_matter.get(key)
    }

    /// Insert or replace a front-matter value. A replaced key keeps its
    /// position.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.front_matter.insert(Value::from(key), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.front_matter.contains_key(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    pub fn created(&self) -> Option<i64> {
        self.get("created").and_then(Value::as_i64)
    }

    pub fn updated(&self) -> Option<i64> {
        self.get("updated").and_then(Value::as_i64)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    fn ordered_front_matter(&self) -> Mapping {
        let mut ordered = Mapping::with_capacity(self.front_matter.len());
        for key in DEFAULT_KEY_ORDER {
            if let Some(value) = self.front_matter.get(key) {
                ordered.insert(Value::from(key), value.clone());
            }
        }
        for (key, value) in &self.front_matter {
            let preferred = key
                .as_str()
                .is_some_and(|k| DEFAULT_KEY_ORDER.contains(&k));
            if !preferred {
                ordered.insert(key.clone(), value.clone());
            }
        }
        ordered
    }
}

fn parse_front_matter(yaml: &str) -> std::result::Result<Mapping, String> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml).map_err(|e| e.to_string())? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(format!("front matter is not a mapping: {:?}", other)),
    }
}

/// Path of the note for `name` inside `vault`, e.g. `vault/refs.Doe2020.md`.
pub fn note_path(vault: &Path, prefix: &str, name: &str) -> PathBuf {
    vault.join(format!("{}{}.md", prefix, name))
}
