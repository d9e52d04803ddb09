//! Precedence resolution for vault configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Config file given on the command line
//! 3. Built-in defaults
//!
//! Relative paths read from a config file are taken relative to the
//! directory containing that file, so a config works no matter where the
//! command is run from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, UpdatedPolicy, VaultConfig};
use crate::{Error, Result};

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from the config file
    File(PathBuf),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::File(path) => write!(f, "file:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The effective options
    pub config: VaultConfig,
    /// Source of every option, by option name
    pub sources: BTreeMap<&'static str, ValueSource>,
}

impl ResolvedConfig {
    /// Where the option `name` came from.
    pub fn source(&self, name: &str) -> Option<&ValueSource> {
        self.sources.get(name)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bib_filename: Option<PathBuf>,
    pub vault_loc: Option<PathBuf>,
    pub note_prefix: Option<String>,
    pub make_tag_notes: Option<bool>,
    pub verbose: Option<bool>,
    pub kebab_case_tag_names: Option<bool>,
    pub template_path: Option<PathBuf>,
    pub updated_policy: Option<UpdatedPolicy>,
    pub convert_notes: Option<bool>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bib_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.bib_filename = Some(path.into());
        self
    }

    pub fn with_vault_loc(mut self, path: impl Into<PathBuf>) -> Self {
        self.vault_loc = Some(path.into());
        self
    }

    pub fn with_note_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.note_prefix = Some(prefix.into());
        self
    }

    pub fn with_make_tag_notes(mut self, enabled: bool) -> Self {
        self.make_tag_notes = Some(enabled);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn with_kebab_case_tag_names(mut self, enabled: bool) -> Self {
        self.kebab_case_tag_names = Some(enabled);
        self
    }

    pub fn with_template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn with_updated_policy(mut self, policy: UpdatedPolicy) -> Self {
        self.updated_policy = Some(policy);
        self
    }

    pub fn with_convert_notes(mut self, enabled: bool) -> Self {
        self.convert_notes = Some(enabled);
        self
    }
}

struct Layers<'a> {
    file_source: ValueSource,
    sources: BTreeMap<&'static str, ValueSource>,
    base_dir: Option<&'a Path>,
}

impl Layers<'_> {
    fn pick<T>(&mut self, name: &'static str, cli: Option<T>, file: Option<T>, default: T) -> T {
        let (value, source) = match (cli, file) {
            (Some(v), _) => (v, ValueSource::CliFlag),
            (None, Some(v)) => (v, self.file_source.clone()),
            (None, None) => (default, ValueSource::Default),
        };
        self.sources.insert(name, source);
        value
    }

    /// Like `pick`, but a relative path from the file is rebased on the
    /// file's directory.
    fn pick_path(
        &mut self,
        name: &'static str,
        cli: Option<PathBuf>,
        file: Option<PathBuf>,
        default: PathBuf,
    ) -> PathBuf {
        let file = file.map(|path| self.rebase(path));
        self.pick(name, cli, file, default)
    }

    fn rebase(&self, path: PathBuf) -> PathBuf {
        match self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }
}

/// Resolve configuration with full precedence chain.
///
/// `config_path` is read when given; a missing file or one with an
/// unrecognized extension is an error.
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let file = match config_path {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let base_dir = config_path
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty());

    let mut layers = Layers {
        file_source: ValueSource::File(config_path.map(Path::to_path_buf).unwrap_or_default()),
        sources: BTreeMap::new(),
        base_dir,
    };
    let defaults = VaultConfig::default();
    let overrides = overrides.clone();

    let bib_filename = layers.pick_path(
        "bib_filename",
        overrides.bib_filename,
        file.bib_filename,
        defaults.bib_filename,
    );
    let vault_loc = layers.pick_path(
        "vault_loc",
        overrides.vault_loc,
        file.vault_loc,
        defaults.vault_loc,
    );
    let template_path = match (overrides.template_path, file.template_path) {
        (Some(path), _) => {
            layers.sources.insert("template_path", ValueSource::CliFlag);
            Some(path)
        }
        (None, Some(path)) => {
            layers
                .sources
                .insert("template_path", layers.file_source.clone());
            Some(layers.rebase(path))
        }
        (None, None) => {
            layers.sources.insert("template_path", ValueSource::Default);
            None
        }
    };

    let config = VaultConfig {
        bib_filename,
        vault_loc,
        note_prefix: layers.pick(
            "note_prefix",
            overrides.note_prefix,
            file.note_prefix,
            defaults.note_prefix,
        ),
        make_tag_notes: layers.pick(
            "make_tag_notes",
            overrides.make_tag_notes,
            file.make_tag_notes,
            defaults.make_tag_notes,
        ),
        verbose: layers.pick(
            "verbose",
            overrides.verbose,
            file.verbose,
            defaults.verbose,
        ),
        kebab_case_tag_names: layers.pick(
            "kebab_case_tag_names",
            overrides.kebab_case_tag_names,
            file.kebab_case_tag_names,
            defaults.kebab_case_tag_names,
        ),
        template_path,
        updated_policy: layers.pick(
            "updated_policy",
            overrides.updated_policy,
            file.updated_policy,
            defaults.updated_policy,
        ),
        bibliography: layers.pick("bibliography", None, file.bibliography, defaults.bibliography),
        pandoc_path: layers.pick("pandoc_path", None, file.pandoc_path, defaults.pandoc_path),
        convert_notes: layers.pick(
            "convert_notes",
            overrides.convert_notes,
            file.convert_notes,
            defaults.convert_notes,
        ),
    };

    config.validate().map_err(Error::InvalidInput)?;

    Ok(ResolvedConfig {
        config,
        sources: layers.sources,
    })
}
