//! Common test utilities for bibvault integration tests.
//!
//! Provides `TestEnv`, a temporary working directory holding a bibliography
//! and the vault generated from it.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A small bibliography exercising authors, keywords, links and notes.
pub const SAMPLE_BIB: &str = r#"@string{pub = "Example Press"}

@article{DoeSmith2020,
  title = {A {Study} of Things},
  author = {Jane Doe and Smith, John},
  year = 2020,
  keywords = {Machine Learning, nlp},
  url = {https://example.org/doe},
  abstract = {We study things.},
}

@Book{knuthTAOCP,
  title = {The Art of Computer Programming},
  author = {Donald E. Knuth},
  publisher = pub,
  collections = {Classics},
  note = {it's a classic},
}
"#;

/// A test environment with an isolated working directory.
///
/// `bibvault()` returns a `Command` running in that directory, so relative
/// paths such as the default `refs.bib` and `vault/` stay inside it.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create an empty test environment.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment with `refs.bib` holding [`SAMPLE_BIB`].
    pub fn with_sample() -> Self {
        let env = Self::new();
        env.write("refs.bib", SAMPLE_BIB);
        env
    }

    /// Get a Command for the bibvault binary running in the environment.
    pub fn bibvault(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bibvault"));
        cmd.current_dir(self.dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Write a file relative to the environment root.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// Read a file relative to the environment root.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).unwrap()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a top-level scalar front-matter value from note text.
pub fn front_matter_value(note: &str, key: &str) -> Option<String> {
    let prefix = format!("{}: ", key);
    note.lines()
        .skip(1)
        .take_while(|line| *line != "---")
        .find_map(|line| line.strip_prefix(&prefix).map(str::to_string))
}
