//! Front-matter maintenance for existing notes.
//!
//! Used to add bibliography files and pandoc filters to every note in a
//! directory after the fact:
//!
//! ```yaml
//! bibliography:
//! - ../refs.bib
//! __defaults__:
//!   filters:
//!   - $FILTERS$/dendron_links_md.py
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use super::NoteDocument;
use crate::{Error, Result};

pub const DEFAULT_BIBLIOGRAPHY: &str = "../refs.bib";
pub const DEFAULT_FILTER: &str = "$FILTERS$/dendron_links_md.py";

/// Append `items` to the list at the nested key path `keys`.
///
/// Missing intermediate mappings are created. If the list already exists,
/// only items not yet present are appended; a scalar in its place becomes
/// the first element of a new list.
pub fn add_to_list(data: &mut Mapping, keys: &[&str], items: &[String]) -> Result<()> {
    let Some((last, parents)) = keys.split_last() else {
        return Err(Error::InvalidInput("empty front-matter key path".to_string()));
    };

    let mut current = data;
    for key in parents {
        let slot = current
            .entry(Value::from(*key))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        current = match slot {
            Value::Mapping(map) => map,
            _ => {
                return Err(Error::InvalidInput(format!(
                    "front-matter key '{}' is not a mapping",
                    key
                )));
            }
        };
    }

    let slot = current
        .entry(Value::from(*last))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if !slot.is_sequence() {
        let previous = std::mem::take(slot);
        *slot = Value::Sequence(vec![previous]);
    }
    if let Value::Sequence(list) = slot {
        for item in items {
            let value = Value::from(item.as_str());
            if !list.contains(&value) {
                list.push(value);
            }
        }
    }
    Ok(())
}

/// Add bibliography files under `bibliography`.
pub fn add_bibliography(data: &mut Mapping, files: &[String]) -> Result<()> {
    add_to_list(data, &["bibliography"], files)
}

/// Add pandoc filters under `__defaults__.filters`.
pub fn add_filters(data: &mut Mapping, filters: &[String]) -> Result<()> {
    add_to_list(data, &["__defaults__", "filters"], filters)
}

/// Apply bibliography and filter additions to one note file in place.
pub fn update_file(path: &Path, bibliography: &[String], filters: &[String]) -> Result<()> {
    let mut note = NoteDocument::load(path)?;
    if !bibliography.is_empty() {
        add_bibliography(&mut note.front_matter, bibliography)?;
    }
    if !filters.is_empty() {
        add_filters(&mut note.front_matter, filters)?;
    }
    note.write(path)
}

/// Update every `*.md` file directly inside `dir`, returning the paths
/// touched in name order.
pub fn update_directory(
    dir: &Path,
    bibliography: &[String],
    filters: &[String],
) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    for path in &paths {
        tracing::debug!("updating front matter of {}", path.display());
        update_file(path, bibliography, filters)?;
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_to_list_creates_nested_keys() {
        let mut data = Mapping::new();
        add_filters(&mut data, &strings(&["f.py"])).unwrap();
        let filters = data
            .get("__defaults__")
            .and_then(|d| d.get("filters"))
            .and_then(Value::as_sequence)
            .unwrap();
        assert_eq!(filters, &vec![Value::from("f.py")]);
    }

    #[test]
    fn test_add_to_list_skips_existing() {
        let mut data = Mapping::new();
        add_bibliography(&mut data, &strings(&["a.bib", "b.bib"])).unwrap();
        add_bibliography(&mut data, &strings(&["b.bib", "c.bib"])).unwrap();
        let list = data.get("bibliography").and_then(Value::as_sequence).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2], Value::from("c.bib"));
    }

    #[test]
    fn test_add_to_list_wraps_scalar() {
        let mut data = Mapping::new();
        data.insert(Value::from("bibliography"), Value::from("old.bib"));
        add_bibliography(&mut data, &strings(&["new.bib"])).unwrap();
        let list = data.get("bibliography").and_then(Value::as_sequence).unwrap();
        assert_eq!(list, &vec![Value::from("old.bib"), Value::from("new.bib")]);
    }

    #[test]
    fn test_add_to_list_rejects_scalar_parent() {
        let mut data = Mapping::new();
        data.insert(Value::from("__defaults__"), Value::from(3));
        assert!(add_filters(&mut data, &strings(&["f.py"])).is_err());
    }

    #[test]
    fn test_update_directory_only_touches_markdown() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "---\ntitle: A\n---\nbody").unwrap();
        fs::write(dir.path().join("b.txt"), "not a note").unwrap();

        let touched =
            update_directory(dir.path(), &strings(&[DEFAULT_BIBLIOGRAPHY]), &[]).unwrap();
        assert_eq!(touched, vec![dir.path().join("a.md")]);

        let note = NoteDocument::load(&dir.path().join("a.md")).unwrap();
        assert!(note.contains("bibliography"));
        assert_eq!(note.body, "body");
        assert_eq!(
            fs::read_to_string(dir.path().join("b.txt")).unwrap(),
            "not a note"
        );
    }
}
