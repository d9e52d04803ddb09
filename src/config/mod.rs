//! Configuration for Bibvault runs.
//!
//! A run is configured by an optional config file plus command-line flags.
//! The file may be YAML (`.yaml`/`.yml`), JSON (`.json`) or TOML (`.toml`);
//! any other extension is rejected. Every option has a built-in default.
//!
//! ## Precedence
//!
//! CLI flag > config file > defaults
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{ConfigOverrides, ResolvedConfig, ValueSource, resolve_config};
pub use schema::{ConfigFile, ConfigFormat, UpdatedPolicy, VaultConfig};
