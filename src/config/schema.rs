//! Schema definitions for vault configuration files.
//!
//! This module provides:
//! - [`VaultConfig`], the complete option set with built-in defaults
//! - [`ConfigFile`], the partial option set read from a YAML, JSON or TOML file
//! - Policy and format enums shared with the CLI

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How the `updated` timestamp of an existing citation note is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdatedPolicy {
    /// Copy the previous `updated` value verbatim
    #[default]
    Preserve,
    /// Set `updated` to now on every regeneration
    Always,
    /// Set `updated` to now only when the rendered note differs
    OnChange,
}

impl UpdatedPolicy {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "preserve" => Some(UpdatedPolicy::Preserve),
            "always" => Some(UpdatedPolicy::Always),
            "on-change" | "on_change" => Some(UpdatedPolicy::OnChange),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdatedPolicy::Preserve => "preserve",
            UpdatedPolicy::Always => "always",
            UpdatedPolicy::OnChange => "on-change",
        }
    }
}

impl std::fmt::Display for UpdatedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialization format of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    /// Format implied by the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Complete set of options for a generation run.
///
/// # YAML Schema
///
/// ```yaml
/// bib_filename: refs.bib
/// vault_loc: vault/
/// note_prefix: refs.
/// make_tag_notes: true
/// verbose: false
/// kebab_case_tag_names: false
/// template_path: null
/// updated_policy: preserve   # or always, on-change
/// bibliography: []
/// pandoc_path: pandoc
/// convert_notes: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultConfig {
    /// Bibliography to read
    pub bib_filename: PathBuf,
    /// Directory the notes are written to
    pub vault_loc: PathBuf,
    /// Prefix of every citation note filename
    pub note_prefix: String,
    /// Whether to create a note per tag
    pub make_tag_notes: bool,
    pub verbose: bool,
    /// Lower-case tags and join words with hyphens instead of underscores
    pub kebab_case_tag_names: bool,
    /// Custom note template; the built-in one is used when unset
    pub template_path: Option<PathBuf>,
    pub updated_policy: UpdatedPolicy,
    /// Bibliography paths written into each citation note's front matter
    pub bibliography: Vec<String>,
    /// Program used to convert HTML and LaTeX notes
    pub pandoc_path: PathBuf,
    /// Whether HTML and LaTeX notes are converted at all
    pub convert_notes: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            bib_filename: PathBuf::from("refs.bib"),
            vault_loc: PathBuf::from("vault/"),
            note_prefix: "refs.".to_string(),
            make_tag_notes: true,
            verbose: false,
            kebab_case_tag_names: false,
            template_path: None,
            updated_policy: UpdatedPolicy::Preserve,
            bibliography: Vec::new(),
            pandoc_path: PathBuf::from("pandoc"),
            convert_notes: true,
        }
    }
}

impl VaultConfig {
    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.bib_filename.as_os_str().is_empty() {
            return Err("bib_filename must not be empty".to_string());
        }
        if self.note_prefix.contains(['/', '\\']) {
            return Err(format!(
                "note_prefix must not contain path separators, got {}",
                self.note_prefix
            ));
        }
        Ok(())
    }

    /// Serialize in the given format.
    pub fn to_string_as(&self, format: ConfigFormat) -> Result<String> {
        Ok(match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Toml => toml::to_string(self)?,
        })
    }
}

/// Options as read from a config file. Unset options fall through to the
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub bib_filename: Option<PathBuf>,
    pub vault_loc: Option<PathBuf>,
    pub note_prefix: Option<String>,
    pub make_tag_notes: Option<bool>,
    pub verbose: Option<bool>,
    pub kebab_case_tag_names: Option<bool>,
    pub template_path: Option<PathBuf>,
    pub updated_policy: Option<UpdatedPolicy>,
    pub bibliography: Option<Vec<String>>,
    pub pandoc_path: Option<PathBuf>,
    pub convert_notes: Option<bool>,
}

impl ConfigFile {
    /// Parse config text in the given format. Blank text is an empty config.
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(match format {
            ConfigFormat::Json => serde_json::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
            ConfigFormat::Toml => toml::from_str(text)?,
        })
    }

    /// Load a config file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| Error::UnknownConfigFormat(path.to_path_buf()))?;
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Enum Tests ====================

    #[test]
    fn test_updated_policy_parse() {
        assert_eq!(UpdatedPolicy::parse("preserve"), Some(UpdatedPolicy::Preserve));
        assert_eq!(UpdatedPolicy::parse("ALWAYS"), Some(UpdatedPolicy::Always));
        assert_eq!(UpdatedPolicy::parse("on-change"), Some(UpdatedPolicy::OnChange));
        assert_eq!(UpdatedPolicy::parse("on_change"), Some(UpdatedPolicy::OnChange));
        assert_eq!(UpdatedPolicy::parse("sometimes"), None);
    }

    #[test]
    fn test_updated_policy_display() {
        assert_eq!(format!("{}", UpdatedPolicy::OnChange), "on-change");
        assert_eq!(UpdatedPolicy::default(), UpdatedPolicy::Preserve);
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("c.yaml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("c.YML")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("dir/c.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("c.toml")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("c.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), None);
    }

    // ==================== VaultConfig Tests ====================

    #[test]
    fn test_vault_config_default() {
        let config = VaultConfig::default();
        assert_eq!(config.bib_filename, PathBuf::from("refs.bib"));
        assert_eq!(config.vault_loc, PathBuf::from("vault/"));
        assert_eq!(config.note_prefix, "refs.");
        assert!(config.make_tag_notes);
        assert!(!config.verbose);
        assert!(!config.kebab_case_tag_names);
        assert!(config.template_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_vault_config_validate_prefix() {
        let config = VaultConfig {
            note_prefix: "refs/".to_string(),
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.unwrap_err().contains("note_prefix"));
    }

    #[test]
    fn test_default_config_reparses_in_every_format() {
        for format in [ConfigFormat::Json, ConfigFormat::Yaml, ConfigFormat::Toml] {
            let text = VaultConfig::default().to_string_as(format).unwrap();
            let parsed = ConfigFile::parse(&text, format).unwrap();
            assert_eq!(parsed.note_prefix.as_deref(), Some("refs."), "{}", format);
            assert_eq!(parsed.updated_policy, Some(UpdatedPolicy::Preserve));
            assert_eq!(parsed.template_path, None);
        }
    }

    // ==================== ConfigFile Tests ====================

    #[test]
    fn test_config_file_partial_yaml() {
        let file = ConfigFile::parse(
            "vault_loc: notes/\nupdated_policy: on-change\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(file.vault_loc, Some(PathBuf::from("notes/")));
        assert_eq!(file.updated_policy, Some(UpdatedPolicy::OnChange));
        assert_eq!(file.bib_filename, None);
    }

    #[test]
    fn test_config_file_rejects_unknown_keys() {
        let result = ConfigFile::parse(r#"{"vault": "x"}"#, ConfigFormat::Json);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_config_file_blank_is_empty() {
        assert_eq!(
            ConfigFile::parse("\n", ConfigFormat::Yaml).unwrap(),
            ConfigFile::default()
        );
    }

    #[test]
    fn test_load_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "x = 1").unwrap();
        assert!(matches!(
            ConfigFile::load(&path),
            Err(Error::UnknownConfigFormat(_))
        ));
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "make_tag_notes = false\nbibliography = [\"../refs.bib\"]\n")
            .unwrap();
        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.make_tag_notes, Some(false));
        assert_eq!(file.bibliography, Some(vec!["../refs.bib".to_string()]));
    }
}
