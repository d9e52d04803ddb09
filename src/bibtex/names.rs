//! Splitting of BibTeX name lists into structured person names.
//!
//! Supports the three classic forms:
//! - `First von Last`
//! - `von Last, First`
//! - `von Last, Jr, First`
//!
//! Braced groups are treated as single, caseless words.

use std::fmt;

/// A person name split into its BibTeX parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name {
    pub first: String,
    pub von: String,
    pub last: String,
    pub jr: String,
}

/// Failure to split a name list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// A `{` without matching `}` (or vice versa)
    UnbalancedBraces(String),
    /// More than two top-level commas in a single name
    TooManyCommas(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::UnbalancedBraces(s) => write!(f, "unbalanced braces in name list: {}", s),
            NameError::TooManyCommas(s) => write!(f, "too many commas in name: {}", s),
        }
    }
}

impl std::error::Error for NameError {}

/// Split a name-list field (`A and B and C`) into names.
pub fn parse_names(field: &str) -> Result<Vec<Name>, NameError> {
    let words = split_words(field).ok_or_else(|| NameError::UnbalancedBraces(field.to_string()))?;

    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in words {
        if word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                names.push(parse_name(&current)?);
                current.clear();
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        names.push(parse_name(&current)?);
    }
    Ok(names)
}

fn parse_name(words: &[&str]) -> Result<Name, NameError> {
    // Regroup words into comma-separated parts; a trailing comma ends a part.
    let mut parts: Vec<Vec<&str>> = vec![Vec::new()];
    for &word in words {
        let mut pieces = split_top_level_commas(word).into_iter().peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                if let Some(part) = parts.last_mut() {
                    part.push(piece);
                }
            }
            if pieces.peek().is_some() {
                parts.push(Vec::new());
            }
        }
    }

    let joined = || words.join(" ");
    match parts.as_slice() {
        [only] => Ok(first_von_last(only)),
        [von_last, first] => {
            let (von, last) = split_von_last(von_last);
            Ok(Name {
                first: first.join(" "),
                von,
                last,
                jr: String::new(),
            })
        }
        [von_last, jr, first] => {
            let (von, last) = split_von_last(von_last);
            Ok(Name {
                first: first.join(" "),
                von,
                last,
                jr: jr.join(" "),
            })
        }
        _ => Err(NameError::TooManyCommas(joined())),
    }
}

fn first_von_last(words: &[&str]) -> Name {
    match words {
        [] => Name::default(),
        [single] => Name {
            last: single.to_string(),
            ..Name::default()
        },
        _ => {
            // von part: from the first lower-case word up to the last one,
            // always leaving at least one word for the last name
            let body = &words[..words.len() - 1];
            let von_start = body.iter().position(|w| is_lowercase_word(w));
            match von_start {
                None => Name {
                    first: body.join(" "),
                    last: words[words.len() - 1].to_string(),
                    ..Name::default()
                },
                Some(start) => {
                    let von_end = body
                        .iter()
                        .rposition(|w| is_lowercase_word(w))
                        .unwrap_or(start)
                        + 1;
                    Name {
                        first: words[..start].join(" "),
                        von: words[start..von_end].join(" "),
                        last: words[von_end..].join(" "),
                        jr: String::new(),
                    }
                }
            }
        }
    }
}

fn split_von_last(words: &[&str]) -> (String, String) {
    if words.len() < 2 {
        return (String::new(), words.join(" "));
    }
    let body = &words[..words.len() - 1];
    match body.iter().rposition(|w| is_lowercase_word(w)) {
        Some(end) => (words[..=end].join(" "), words[end + 1..].join(" ")),
        None => (String::new(), words.join(" ")),
    }
}

fn is_lowercase_word(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_lowercase)
}

/// Split on whitespace outside of braces; `None` if braces are unbalanced.
fn split_words(s: &str) -> Option<Vec<&str>> {
    let mut words = Vec::new();
    let mut depth: i32 = 0;
    let mut start: Option<usize> = None;

    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(st) = start.take() {
                words.push(&s[st..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if depth != 0 {
        return None;
    }
    if let Some(st) = start {
        words.push(&s[st..]);
    }
    Some(words)
}

/// Split a single word on commas that are not inside braces.
fn split_top_level_commas(word: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    for (i, c) in word.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push(&word[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&word[start..]);
    pieces
}
