//! Command implementations for Bibvault CLI.
//!
//! This module contains the business logic for each CLI command:
//! - `generate` - Build or refresh the vault from a bibliography
//! - `print_default_config` - Show the built-in option set
//! - `update_frontmatter` - Add bibliography and filter entries to existing notes

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::Result;
use crate::config::{ConfigFormat, ConfigOverrides, VaultConfig, resolve_config};
use crate::logging;
use crate::note::frontmatter;
use crate::vault::{RunSummary, VaultGenerator};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_or_error<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "failed to serialize result: {}"}}"#, e))
}

// === Generate ===

impl Output for RunSummary {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Processed {} entries into {}",
            self.entries,
            self.vault.display()
        )];
        lines.push(format!(
            "  Citation notes: {} created, {} rewritten",
            self.notes_created, self.notes_rewritten
        ));
        if self.timestamps_refreshed > 0 {
            lines.push(format!(
                "  Updated timestamps refreshed: {}",
                self.timestamps_refreshed
            ));
        }
        lines.push(format!(
            "  Tag notes: {} created, {} already present",
            self.tag_notes_created, self.tag_notes_skipped
        ));
        lines.join("\n")
    }
}

/// Resolve the configuration and generate the vault.
pub fn generate(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<RunSummary> {
    let resolved = resolve_config(config_path, overrides)?;
    if resolved.config.verbose {
        logging::set_verbose(true);
    }
    for (name, source) in &resolved.sources {
        tracing::debug!("config {} from {}", name, source);
    }
    tracing::debug!("config: {:?}", resolved.config);

    VaultGenerator::new(resolved.config).run()
}

// === Default config ===

/// The default option set rendered in one format.
#[derive(Debug, Clone)]
pub struct DefaultConfig {
    pub format: ConfigFormat,
    pub text: String,
}

impl Output for DefaultConfig {
    /// The rendered config is the output whatever the output mode.
    fn to_json(&self) -> String {
        self.text.trim_end().to_string()
    }

    fn to_human(&self) -> String {
        self.text.trim_end().to_string()
    }
}

/// Render the built-in defaults in `format`.
pub fn print_default_config(format: ConfigFormat) -> Result<DefaultConfig> {
    Ok(DefaultConfig {
        format,
        text: VaultConfig::default().to_string_as(format)?,
    })
}

// === Front matter ===

#[derive(Serialize)]
pub struct FrontmatterUpdated {
    pub directory: PathBuf,
    pub bibliography: Vec<String>,
    pub filters: Vec<String>,
    pub files: Vec<PathBuf>,
}

impl Output for FrontmatterUpdated {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        if self.files.is_empty() {
            return format!("No notes found in {}", self.directory.display());
        }
        let mut lines = vec![format!(
            "Updated front matter of {} note(s) in {}:",
            self.files.len(),
            self.directory.display()
        )];
        for file in &self.files {
            lines.push(format!("  {}", file.display()));
        }
        lines.join("\n")
    }
}

/// Add bibliography paths and filters to every note in `dir`.
///
/// Empty lists fall back to the defaults.
pub fn update_frontmatter(
    dir: &Path,
    bibliography: Vec<String>,
    filters: Vec<String>,
) -> Result<FrontmatterUpdated> {
    let bibliography = if bibliography.is_empty() {
        vec![frontmatter::DEFAULT_BIBLIOGRAPHY.to_string()]
    } else {
        bibliography
    };
    let filters = if filters.is_empty() {
        vec![frontmatter::DEFAULT_FILTER.to_string()]
    } else {
        filters
    };

    let files = frontmatter::update_directory(dir, &bibliography, &filters)?;
    Ok(FrontmatterUpdated {
        directory: dir.to_path_buf(),
        bibliography,
        filters,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_summary_human() {
        let summary = RunSummary {
            vault: PathBuf::from("vault/"),
            entries: 3,
            notes_created: 1,
            notes_rewritten: 2,
            timestamps_refreshed: 0,
            tag_notes_created: 4,
            tag_notes_skipped: 5,
        };
        let human = summary.to_human();
        assert!(human.contains("Processed 3 entries into vault/"));
        assert!(human.contains("1 created, 2 rewritten"));
        assert!(human.contains("4 created, 5 already present"));
        assert!(!human.contains("refreshed"));

        let json: serde_json::Value = serde_json::from_str(&summary.to_json()).unwrap();
        assert_eq!(json["notes_rewritten"], 2);
    }

    #[test]
    fn test_print_default_config_yaml() {
        let result = print_default_config(ConfigFormat::Yaml).unwrap();
        assert!(result.to_human().contains("note_prefix: refs."));
        assert_eq!(result.to_json(), result.to_human());
    }

    #[test]
    fn test_update_frontmatter_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("n.md"), "---\ntitle: n\n---\n").unwrap();
        let result = update_frontmatter(dir.path(), Vec::new(), Vec::new()).unwrap();
        assert_eq!(result.bibliography, [frontmatter::DEFAULT_BIBLIOGRAPHY]);
        assert_eq!(result.filters, [frontmatter::DEFAULT_FILTER]);
        assert_eq!(result.files.len(), 1);
        assert!(result.to_human().contains("1 note(s)"));
    }
}
