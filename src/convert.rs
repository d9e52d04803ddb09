//! Rich-text to markdown conversion through an external `pandoc` binary.
//!
//! Conversion is optional: when pandoc is not installed, callers fall back to
//! plain-text cleanup. [`NoConverter`] stands in when conversion is disabled.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::{Error, Result};

/// Seconds to wait for a single pandoc conversion.
const CONVERT_TIMEOUT_SECS: u64 = 30;

/// Markup a note can be converted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Html,
    Latex,
}

impl SourceFormat {
    /// Name of the format as understood by pandoc's `--from`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Html => "html",
            SourceFormat::Latex => "latex",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Converts markup text to markdown.
pub trait MarkupConverter {
    /// Whether conversions can be attempted at all.
    fn is_available(&self) -> bool;

    /// Convert `text` from `from` to markdown.
    fn convert(&self, text: &str, from: SourceFormat) -> Result<String>;
}

/// Converter used when conversion is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConverter;

impl MarkupConverter for NoConverter {
    fn is_available(&self) -> bool {
        false
    }

    fn convert(&self, _text: &str, from: SourceFormat) -> Result<String> {
        Err(Error::Convert(format!(
            "no converter installed for {}",
            from
        )))
    }
}

/// Runs `pandoc -f <format> -t markdown`, feeding the note on stdin.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    timeout: Duration,
    available: bool,
}

impl PandocConverter {
    /// Create a converter for `program`, probing once whether it runs.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let available = Self::detect(&program);
        if !available {
            tracing::warn!(
                "{} not available, notes will not be converted from HTML or LaTeX",
                program.display()
            );
        }
        Self {
            program,
            timeout: Duration::from_secs(CONVERT_TIMEOUT_SECS),
            available,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if the program is found and executable.
    pub fn detect(program: &std::path::Path) -> bool {
        Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl MarkupConverter for PandocConverter {
    fn is_available(&self) -> bool {
        self.available
    }

    fn convert(&self, text: &str, from: SourceFormat) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["--from", from.as_str(), "--to", "markdown"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::Convert(format!("failed to spawn {}: {}", self.program.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Convert("failed to capture stdin".to_string()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Convert("failed to capture stdout".to_string()))?;

        // Feed and drain on separate threads so a large note cannot fill a
        // pipe while we wait on the process.
        let input = text.to_string();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));
        let reader = thread::spawn(move || {
            let mut out = String::new();
            stdout.read_to_string(&mut out).map(|_| out)
        });

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Convert(format!(
                    "pandoc timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let written = writer
            .join()
            .map_err(|_| Error::Convert("stdin writer panicked".to_string()))?;
        let output = reader
            .join()
            .map_err(|_| Error::Convert("stdout reader panicked".to_string()))??;

        if !status.success() {
            return Err(Error::Convert(format!(
                "pandoc exited with {} converting {}",
                status, from
            )));
        }
        written?;
        Ok(output)
    }
}
