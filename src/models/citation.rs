//! Citation entries built from bibliography records.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::note_text::process_note;
use crate::bibtex::{BibEntry, FieldMap};
use crate::convert::MarkupConverter;
use crate::names::{AuthorRegistry, is_blank_author_tag, name_to_tag};
use crate::normalize::{strip_format, tagify};
use crate::note::NoteDocument;
use crate::render::TemplateRenderer;
use crate::Result;

/// Field names tried, in order, for the abstract.
pub const ABSTRACT_FIELDS: [&str; 3] = ["abstract", "abstractnote", "summary"];
/// Field names tried, in order, for free-text notes.
pub const NOTE_FIELDS: [&str; 6] = [
    "note",
    "notes",
    "annote",
    "annotation",
    "annotations",
    "comments",
];
/// Field names tried, in order, for the date.
pub const DATE_FIELDS: [&str; 2] = ["date", "year"];
/// Field names tried, in order, for attached files.
pub const FILE_FIELDS: [&str; 2] = ["file", "files"];

/// Trait id marking a citation note.
pub const REFERENCE_TRAIT: &str = "referenceNote";

/// An author tag paired with the display name it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorTag {
    pub tag_name: String,
    pub str_name: String,
}

/// One normalized bibliography record.
///
/// `authors` and `author_tags` always have the same length and line up
/// positionally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitationEntry {
    pub bib_key: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub author_tags: Vec<AuthorTag>,
    pub typ: Option<String>,
    pub date: Option<String>,
    pub links: Vec<String>,
    pub files: Vec<String>,
    pub keywords: Vec<String>,
    pub collections: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub note: Option<String>,
    pub bib_meta: FieldMap,
}

fn field(fields: &FieldMap, names: &[&str]) -> Option<String> {
    fields.get_any(names).map(strip_format)
}

fn split_field(fields: &FieldMap, name: &str, sep: char) -> Vec<String> {
    fields
        .get(name)
        .map(|value| {
            value
                .split(sep)
                .map(strip_format)
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn unescape_path(path: &str) -> String {
    path.replace("\\:", ":").replace("\\\\", "/")
}

impl CitationEntry {
    /// Build an entry from a parsed record.
    ///
    /// Missing fields become empty. An author list that cannot be parsed is
    /// logged and treated as no authors.
    pub fn from_entry(
        entry: &BibEntry,
        kebab_case: bool,
        registry: &mut AuthorRegistry,
        converter: &dyn MarkupConverter,
    ) -> Self {
        let fields = &entry.fields;

        let names = entry.authors().unwrap_or_else(|e| {
            tracing::warn!("{}: {}", entry.key, e);
            Vec::new()
        });
        let mut authors = Vec::with_capacity(names.len());
        let mut author_tags = Vec::with_capacity(names.len());
        for name in &names {
            let last = if name.von.is_empty() {
                name.last.clone()
            } else {
                format!("{} {}", name.von, name.last)
            };
            let display = strip_format(&format!("{} {}", name.first, last));
            author_tags.push(AuthorTag {
                tag_name: name_to_tag(&name.first, &name.last, kebab_case, registry),
                str_name: display.clone(),
            });
            authors.push(display);
        }

        let files = FILE_FIELDS
            .iter()
            .find(|name| fields.get(name).is_some())
            .map(|name| split_field(fields, name, ';'))
            .unwrap_or_default()
            .iter()
            .map(|path| unescape_path(path))
            .collect();

        let keywords = split_field(fields, "keywords", ',')
            .iter()
            .map(|keyword| tagify(keyword, kebab_case))
            .collect();
        let collections = split_field(fields, "collections", ',')
            .iter()
            .map(|collection| tagify(collection, kebab_case))
            .collect();

        let note = fields
            .get_any(&NOTE_FIELDS)
            .map(|text| process_note(text, converter))
            .filter(|text| !text.is_empty());

        Self {
            bib_key: entry.key.clone(),
            title: field(fields, &["title"]),
            authors,
            author_tags,
            typ: Some(entry.entry_type.clone()),
            date: field(fields, &DATE_FIELDS),
            links: split_field(fields, "url", ';'),
            files,
            keywords,
            collections,
            abstract_text: field(fields, &ABSTRACT_FIELDS).filter(|text| !text.is_empty()),
            note,
            bib_meta: fields.clone(),
        }
    }

    /// Author tags followed by keywords and collections.
    ///
    /// Author tags that reduced to nothing are left out.
    pub fn all_tags(&self) -> Vec<String> {
        self.author_tags
            .iter()
            .map(|t| t.tag_name.clone())
            .filter(|tag| !is_blank_author_tag(tag))
            .chain(self.keywords.iter().cloned())
            .chain(self.collections.iter().cloned())
            .collect()
    }

    /// Render the citation note.
    ///
    /// The result has fresh `created`/`updated` timestamps and no `id`;
    /// the vault generator settles those against any existing file.
    pub fn to_note(
        &self,
        renderer: &TemplateRenderer,
        bibliography: &[String],
    ) -> Result<NoteDocument> {
        let mut front_matter = Mapping::new();
        front_matter.insert(Value::from("traitIds"), Value::from(REFERENCE_TRAIT));

        let mut note = NoteDocument::with_defaults(front_matter, false);
        note.set(
            "title",
            self.title.as_deref().map_or(Value::Null, Value::from),
        );
        note.set("tags", self.keywords.clone());
        note.set("attached_files", self.files.clone());
        note.set("authors", self.authors.clone());
        note.set("bibtex_key", self.bib_key.as_str());
        if !bibliography.is_empty() {
            note.set("bibliography", bibliography.to_vec());
        }

        note.body = renderer.render_data(self)?;
        Ok(note)
    }
}
