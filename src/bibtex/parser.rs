//! Recursive-descent reader for BibTeX source text.
//!
//! Produces entries in source order with lower-cased citation keys and
//! lower-cased field names. Field values are kept verbatim apart from the
//! outer delimiters, so nested braces survive for later cleanup.

use std::collections::HashMap;

use super::{BibEntry, FieldMap};
use crate::{Error, Result};

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Parse BibTeX source into entries, in order of appearance.
pub fn parse(src: &str) -> Result<Vec<BibEntry>> {
    Parser::new(src).parse_all()
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    macros: HashMap<String, String>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let macros = MONTHS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            macros,
        }
    }

    fn parse_all(mut self) -> Result<Vec<BibEntry>> {
        let mut entries: Vec<BibEntry> = Vec::new();

        while self.skip_to_entry() {
            let start = self.pos;
            self.pos += 1;
            let kind = self.identifier().to_ascii_lowercase();
            self.skip_whitespace();
            let close = match self.peek() {
                Some(b'{') if !kind.is_empty() => b'}',
                Some(b'(') if !kind.is_empty() => b')',
                // A stray '@' in free text, e.g. an email address in a comment.
                _ => {
                    self.pos = start + 1;
                    continue;
                }
            };
            self.pos += 1;

            match kind.as_str() {
                "comment" | "preamble" => self.skip_body(close, start)?,
                "string" => self.parse_macro(close)?,
                _ => {
                    let entry = self.parse_entry(kind, close)?;
                    if entries.iter().any(|e| e.key == entry.key) {
                        return Err(
                            self.error_at(start, &format!("duplicate entry key '{}'", entry.key))
                        );
                    }
                    entries.push(entry);
                }
            }
        }

        Ok(entries)
    }

    fn parse_entry(&mut self, entry_type: String, close: u8) -> Result<BibEntry> {
        self.skip_whitespace();
        let key_start = self.pos;
        while let Some(b) = self.peek() {
            if b == b',' || b == close || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        let key = self.src[key_start..self.pos].to_lowercase();
        if key.is_empty() {
            return Err(self.error("missing citation key"));
        }

        let mut fields = FieldMap::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.error("unexpected end of input inside entry")),
                _ => return Err(self.error("expected ',' or end of entry")),
            }

            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                break;
            }

            let name = self.identifier().to_ascii_lowercase();
            if name.is_empty() {
                return Err(self.error("expected field name"));
            }
            self.expect(b'=')?;
            let value = self.parse_value()?;
            fields.insert(name, value);
        }

        Ok(BibEntry {
            entry_type,
            key,
            fields,
        })
    }

    fn parse_macro(&mut self, close: u8) -> Result<()> {
        self.skip_whitespace();
        let name = self.identifier().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error("expected macro name in @string"));
        }
        self.expect(b'=')?;
        let value = self.parse_value()?;
        self.expect(close)?;
        self.macros.insert(name, value);
        Ok(())
    }

    /// A value is one or more pieces joined with `#`.
    fn parse_value(&mut self) -> Result<String> {
        let mut value = self.parse_piece()?;
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'#') {
                return Ok(value);
            }
            self.pos += 1;
            value.push_str(&self.parse_piece()?);
        }
    }

    fn parse_piece(&mut self) -> Result<String> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => {
                let open = self.pos;
                self.pos += 1;
                let start = self.pos;
                self.skip_balanced(b'}', open)?;
                Ok(self.src[start..self.pos - 1].to_string())
            }
            Some(b'"') => self.quoted(),
            Some(b) if b.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
                Ok(self.src[start..self.pos].to_string())
            }
            Some(_) => {
                let start = self.pos;
                let name = self.identifier().to_ascii_lowercase();
                if name.is_empty() {
                    return Err(self.error("expected field value"));
                }
                self.macros
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| self.error_at(start, &format!("undefined macro '{}'", name)))
            }
            None => Err(self.error("unexpected end of input, expected field value")),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'\\' => self.pos += 1,
                b'"' if depth == 0 => {
                    let value = self.src[start..self.pos].to_string();
                    self.pos += 1;
                    return Ok(value);
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(self.error_at(open, "unterminated quoted value"))
    }

    /// Consume up to and including the `close` byte matching an already
    /// consumed opener, honouring nested braces.
    fn skip_balanced(&mut self, close: u8, open: usize) -> Result<()> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == close && depth == 0 {
                return Ok(());
            }
            match b {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        Err(self.error_at(open, "unbalanced braces"))
    }

    fn skip_body(&mut self, close: u8, start: usize) -> Result<()> {
        self.skip_balanced(close, start)
    }

    /// Move to the next `@`; returns false at end of input.
    fn skip_to_entry(&mut self) -> bool {
        match self.src[self.pos..].find('@') {
            Some(offset) => {
                self.pos += offset;
                true
            }
            None => {
                self.pos = self.bytes.len();
                false
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b"{}(),=#\"@%".contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &src[start..self.pos]
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", b as char)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, message: &str) -> Error {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: &str) -> Error {
        let end = pos.min(self.bytes.len());
        Error::Bibtex {
            line: self.bytes[..end].iter().filter(|&&b| b == b'\n').count() + 1,
            message: message.to_string(),
        }
    }
}
