//! CLI argument definitions for Bibvault.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ConfigOverrides, UpdatedPolicy};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("BIBVAULT_GIT_COMMIT"),
    ", built ",
    env!("BIBVAULT_BUILD_TIMESTAMP"),
    ")"
);

/// Bibvault - Turn a BibTeX bibliography into a vault of markdown notes.
///
/// Start with `bibvault print-default-config --format yaml > config.yaml`,
/// edit it, then run `bibvault generate config.yaml`.
#[derive(Parser, Debug)]
#[command(name = "bibvault")]
#[command(author, version, long_version = LONG_VERSION, about = "Generate markdown reference notes from a BibTeX bibliography", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Show per-entry and per-tag progress on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate or refresh the vault
    ///
    /// Writes one note per bibliography entry and one note per tag. Existing
    /// citation notes keep their id and timestamps; existing tag notes are
    /// left alone.
    Generate {
        /// Config file (.yaml, .yml, .json or .toml)
        config: Option<PathBuf>,

        #[command(flatten)]
        options: GenerateOptions,
    },

    /// Print the default configuration
    PrintDefaultConfig {
        /// Output format
        #[arg(long, default_value = "json", value_parser = ["json", "yaml", "yml", "toml"])]
        format: String,
    },

    /// Add bibliography files and pandoc filters to the front matter of
    /// every note in a directory
    Frontmatter {
        /// Directory containing the notes
        dir: PathBuf,

        /// Bibliography path to add (repeatable, default: ../refs.bib)
        #[arg(long = "bib")]
        bibliography: Vec<String>,

        /// Pandoc filter to add (repeatable, default: $FILTERS$/dendron_links_md.py)
        #[arg(long = "filter")]
        filters: Vec<String>,
    },
}

/// Flags of `generate` that override the config file.
#[derive(clap::Args, Debug, Default)]
pub struct GenerateOptions {
    /// Bibliography to read
    #[arg(long)]
    pub bib_filename: Option<PathBuf>,

    /// Directory the notes are written to
    #[arg(long)]
    pub vault_loc: Option<PathBuf>,

    /// Prefix of citation note filenames
    #[arg(long)]
    pub note_prefix: Option<String>,

    /// Do not create tag notes
    #[arg(long)]
    pub no_tag_notes: bool,

    /// Lower-case tag names and join words with hyphens
    #[arg(long)]
    pub kebab_case_tag_names: bool,

    /// Custom note template
    #[arg(long)]
    pub template_path: Option<PathBuf>,

    /// How `updated` is handled for existing notes
    #[arg(long, value_parser = ["preserve", "always", "on-change"])]
    pub updated_policy: Option<String>,

    /// Do not convert HTML or LaTeX notes with pandoc
    #[arg(long)]
    pub no_convert_notes: bool,
}

impl GenerateOptions {
    /// Turn the flags into config overrides. Boolean flags only override
    /// when given.
    pub fn to_overrides(&self, verbose: bool) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        overrides.bib_filename = self.bib_filename.clone();
        overrides.vault_loc = self.vault_loc.clone();
        overrides.note_prefix = self.note_prefix.clone();
        overrides.template_path = self.template_path.clone();
        overrides.updated_policy = self
            .updated_policy
            .as_deref()
            .and_then(UpdatedPolicy::parse);
        if self.no_tag_notes {
            overrides = overrides.with_make_tag_notes(false);
        }
        if self.kebab_case_tag_names {
            overrides = overrides.with_kebab_case_tag_names(true);
        }
        if self.no_convert_notes {
            overrides = overrides.with_convert_notes(false);
        }
        if verbose {
            overrides = overrides.with_verbose(true);
        }
        overrides
    }
}
