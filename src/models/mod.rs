//! Data models for Bibvault entities.
//!
//! This module defines the core data structures:
//! - `CitationEntry` - A normalized bibliography record, ready to render
//! - `AuthorTag` - An author tag paired with its display name
//! - `NoteFormat` - The guessed markup of a free-text note field

pub mod citation;
pub mod note_text;

pub use citation::{AuthorTag, CitationEntry};
pub use note_text::{NoteFormat, classify, process_note};
