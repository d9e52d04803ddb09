//! Best-effort cleanup of free-text note fields.
//!
//! Notes exported by reference managers arrive as HTML, LaTeX, or mangled
//! plain text. [`classify`] guesses which from character densities and
//! [`process_note`] dispatches accordingly. The thresholds are empirical.

use crate::convert::{MarkupConverter, SourceFormat};

/// Fraction of `<` and of `>` characters above which a note is HTML.
pub const HTML_DENSITY: f64 = 0.05;
/// Fraction of backslashes above which a note is LaTeX.
pub const LATEX_DENSITY: f64 = 0.01;
/// Fraction of tildes above which tildes are taken to be spaces.
pub const TILDE_DENSITY: f64 = 0.1;

/// Guessed markup of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteFormat {
    PlainText,
    Html,
    Latex,
}

fn density(text: &str, ch: char, len: usize) -> f64 {
    text.chars().filter(|&c| c == ch).count() as f64 / len as f64
}

/// Classify a note by character density.
pub fn classify(text: &str) -> NoteFormat {
    let len = text.chars().count();
    if len == 0 {
        return NoteFormat::PlainText;
    }
    if density(text, '<', len) > HTML_DENSITY && density(text, '>', len) > HTML_DENSITY {
        NoteFormat::Html
    } else if density(text, '\\', len) > LATEX_DENSITY {
        NoteFormat::Latex
    } else {
        NoteFormat::PlainText
    }
}

/// Clean up a note for inclusion in markdown.
///
/// HTML and LaTeX notes go through `converter` when it is available; if that
/// fails or is not possible, the plain-text rewrites apply.
pub fn process_note(text: &str, converter: &dyn MarkupConverter) -> String {
    if text.is_empty() {
        return String::new();
    }

    if converter.is_available() {
        let source = match classify(text) {
            NoteFormat::Html => Some(SourceFormat::Html),
            NoteFormat::Latex => Some(SourceFormat::Latex),
            NoteFormat::PlainText => None,
        };
        if let Some(source) = source {
            match converter.convert(text, source) {
                Ok(markdown) => return drop_blank_lines(&markdown.replace("# ", "## ")),
                Err(e) => tracing::warn!("couldn't convert note as {}: {}", source, e),
            }
        }
    }

    clean_plain_text(text)
}

/// Fixed rewrites for notes that are neither converted HTML nor LaTeX.
///
/// Blank lines are kept here, unlike converter output which goes through
/// [`drop_blank_lines`]; `\par` paragraph breaks survive as empty lines.
pub fn clean_plain_text(text: &str) -> String {
    let cleaned = text
        .replace("\\par", "\n\n")
        .replace("{$>$}", ">")
        .replace("$>$", ">")
        .replace("\\#", "#")
        .replace("# ", "## ")
        .replace('`', "\"")
        .replace('\'', "\"")
        .replace('\\', "")
        .replace("\n ", "\n");

    let len = cleaned.chars().count();
    if len > 0 && density(&cleaned, '~', len) > TILDE_DENSITY {
        cleaned.replace('~', " ")
    } else {
        cleaned
    }
}

/// Remove lines that are empty or whitespace only.
pub fn drop_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
