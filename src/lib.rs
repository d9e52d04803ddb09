//! Bibvault - Generate a vault of markdown reference notes from BibTeX.
//!
//! This library provides the core functionality for the `bibvault` CLI tool:
//! reading a bibliography, normalizing its fields into tags, rendering one
//! note per citation and merging it with any note already in the vault.

use std::path::PathBuf;

pub mod bibtex;
pub mod cli;
pub mod commands;
pub mod config;
pub mod convert;
pub mod logging;
pub mod models;
pub mod names;
pub mod normalize;
pub mod note;
pub mod render;
pub mod vault;

/// Library-level error type for Bibvault operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("BibTeX parse error at line {line}: {message}")]
    Bibtex { line: usize, message: String },

    #[error(
        "manually read keys count doesn't match number of keys in database: scanned {scanned}, parsed {parsed}"
    )]
    KeyMismatch { scanned: usize, parsed: usize },

    #[error("key {0} not found in database, expected from scanned keys")]
    MissingKey(String),

    #[error("unknown config file type: {}", .0.display())]
    UnknownConfigFormat(PathBuf),

    #[error("Malformed front matter in {}: {message}", path.display())]
    FrontMatter { path: PathBuf, message: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Conversion error: {0}")]
    Convert(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Bibvault operations.
pub type Result<T> = std::result::Result<T, Error>;
