//! Diagnostic output on stderr.
//!
//! Warnings are always shown. Verbose mode adds per-entry and per-tag
//! progress at debug level. `RUST_LOG`, when set, takes precedence over both.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn filter_for(verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if verbose {
        EnvFilter::new("bibvault=debug,warn")
    } else {
        EnvFilter::new("warn")
    }
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init(verbose: bool) {
    let (filter, handle) = reload::Layer::new(filter_for(verbose));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// Switch verbose output on or off after [`init`], e.g. once a config file
/// has been read.
pub fn set_verbose(verbose: bool) {
    if let Some(handle) = FILTER_HANDLE.get() {
        if let Err(e) = handle.reload(filter_for(verbose)) {
            tracing::warn!("couldn't change log level: {}", e);
        }
    }
}
