//! Vault generation.
//!
//! A run reads the bibliography, writes one citation note per entry and then
//! one note per distinct tag. Citation notes are always rewritten in full,
//! but an existing note's `id`, `created` and `updated` values are carried
//! over so that regenerating an unchanged bibliography keeps note identity.
//! Tag notes are created once and never overwritten.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Mapping;

use crate::Result;
use crate::bibtex::{Bibliography, load_bibliography};
use crate::config::{UpdatedPolicy, VaultConfig};
use crate::convert::{MarkupConverter, NoConverter, PandocConverter};
use crate::models::CitationEntry;
use crate::names::{AUTHOR_TAG_PREFIX, AuthorRegistry};
use crate::note::{NoteDocument, generate_note_id, note_path};
use crate::render::TemplateRenderer;

/// Prefix of every tag note filename.
pub const TAG_NOTE_PREFIX: &str = "tags.";

/// What happened to a citation note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    /// No note existed at the path
    Created,
    /// An existing note was rewritten; `refreshed` tells whether its
    /// `updated` timestamp moved
    Rewritten { refreshed: bool },
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub vault: PathBuf,
    pub entries: usize,
    pub notes_created: usize,
    pub notes_rewritten: usize,
    pub timestamps_refreshed: usize,
    pub tag_notes_created: usize,
    pub tag_notes_skipped: usize,
}

/// Generates a vault from a bibliography.
pub struct VaultGenerator {
    config: VaultConfig,
    converter: Option<Box<dyn MarkupConverter>>,
    registry: AuthorRegistry,
}

impl VaultGenerator {
    pub fn new(config: VaultConfig) -> Self {
        Self {
            config,
            converter: None,
            registry: AuthorRegistry::new(),
        }
    }

    /// Use `converter` for notes instead of the one the config selects.
    pub fn with_converter(mut self, converter: Box<dyn MarkupConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Author spellings recorded by the last run.
    pub fn registry(&self) -> &AuthorRegistry {
        &self.registry
    }

    /// Path of the citation note for `key`.
    pub fn citation_note_path(&self, key: &str) -> PathBuf {
        note_path(&self.config.vault_loc, &self.config.note_prefix, key)
    }

    /// Path of the tag note for `tag`.
    pub fn tag_note_path(&self, tag: &str) -> PathBuf {
        note_path(&self.config.vault_loc, TAG_NOTE_PREFIX, tag)
    }

    /// Run a full generation.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.registry.clear();

        let bibliography = load_bibliography(&self.config.bib_filename)?;
        let renderer = TemplateRenderer::from_path(self.config.template_path.as_deref())?;
        fs::create_dir_all(&self.config.vault_loc)?;

        let mut summary = RunSummary {
            vault: self.config.vault_loc.clone(),
            entries: bibliography.len(),
            ..Default::default()
        };
        let mut tags = BTreeSet::new();

        let converter = self.take_converter();
        let written = self.write_citation_notes(
            &bibliography,
            &renderer,
            converter.as_ref(),
            &mut summary,
            &mut tags,
        );
        self.converter = Some(converter);
        written?;

        if self.config.make_tag_notes {
            for tag in &tags {
                tracing::debug!("processing tag: {}", tag);
                if self.make_tag_note(tag)? {
                    summary.tag_notes_created += 1;
                } else {
                    summary.tag_notes_skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    fn write_citation_notes(
        &mut self,
        bibliography: &Bibliography,
        renderer: &TemplateRenderer,
        converter: &dyn MarkupConverter,
        summary: &mut RunSummary,
        tags: &mut BTreeSet<String>,
    ) -> Result<()> {
        for entry in bibliography.entries() {
            tracing::debug!("processing key: {}", entry.key);

            let citation = CitationEntry::from_entry(
                entry,
                self.config.kebab_case_tag_names,
                &mut self.registry,
                converter,
            );
            tags.extend(citation.all_tags());

            let mut note = citation.to_note(renderer, &self.config.bibliography)?;
            let path = self.citation_note_path(&entry.key);
            match merge_existing(&mut note, &path, self.config.updated_policy)? {
                NoteStatus::Created => summary.notes_created += 1,
                NoteStatus::Rewritten { refreshed } => {
                    summary.notes_rewritten += 1;
                    if refreshed {
                        summary.timestamps_refreshed += 1;
                    }
                }
            }
            note.write(&path)?;
        }
        Ok(())
    }

    fn take_converter(&mut self) -> Box<dyn MarkupConverter> {
        if let Some(converter) = self.converter.take() {
            return converter;
        }
        if self.config.convert_notes {
            Box::new(PandocConverter::new(&self.config.pandoc_path))
        } else {
            Box::new(NoConverter)
        }
    }

    /// Create the note for `tag` unless one exists. Returns whether a note
    /// was written.
    pub fn make_tag_note(&self, tag: &str) -> Result<bool> {
        let path = self.tag_note_path(tag);
        if path.exists() {
            return Ok(false);
        }

        let mut note = NoteDocument::with_defaults(Mapping::new(), true);
        note.set("title", tag);
        note.body = tag_note_body(tag, &self.registry);
        note.write(&path)?;
        Ok(true)
    }
}

/// Body of a tag note: a heading, plus the known spellings for author tags.
pub fn tag_note_body(tag: &str, registry: &AuthorRegistry) -> String {
    let mut body = format!("# {}\n\n", tag);
    if tag.starts_with(AUTHOR_TAG_PREFIX) {
        let names: Vec<String> = registry
            .spellings(tag)
            .iter()
            .map(|name| format!("- {}", name))
            .collect();
        body.push_str("## Author names:\n\n");
        body.push_str(&names.join("\n"));
    }
    body
}

/// Settle `note`'s identity against the file already at `path`, if any.
///
/// A new note gets a fresh id and keeps its fresh timestamps. For an
/// existing file, `created`, `updated` and `id` are copied over when
/// present, a missing id is generated, and `updated` is then handled
/// according to `policy`.
pub fn merge_existing(
    note: &mut NoteDocument,
    path: &Path,
    policy: UpdatedPolicy,
) -> Result<NoteStatus> {
    if !path.exists() {
        note.set("id", generate_note_id());
        return Ok(NoteStatus::Created);
    }

    let previous = NoteDocument::load(path)?;
    for key in ["created", "updated", "id"] {
        if let Some(value) = previous.get(key) {
            note.set(key, value.clone());
        }
    }
    if !note.contains("id") {
        note.set("id", generate_note_id());
    }

    let refreshed = match policy {
        UpdatedPolicy::Preserve => false,
        UpdatedPolicy::Always => true,
        UpdatedPolicy::OnChange => note.dump()? != previous.dump()?,
    };
    if refreshed {
        note.update_timestamp();
    }
    Ok(NoteStatus::Rewritten { refreshed })
}
