//! Stamps `--version` output with when and from what source the binary was built.
//!
//! `BIBVAULT_BUILD_TIMESTAMP` honors `SOURCE_DATE_EPOCH` for reproducible
//! builds. `BIBVAULT_GIT_COMMIT` is `git describe --always --dirty`, or
//! "unknown" outside a checkout.

use std::env;
use std::process::Command;

use chrono::{DateTime, Utc};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    println!(
        "cargo:rustc-env=BIBVAULT_BUILD_TIMESTAMP={}",
        build_time().format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!(
        "cargo:rustc-env=BIBVAULT_GIT_COMMIT={}",
        describe_source().as_deref().unwrap_or("unknown")
    );
}

fn build_time() -> DateTime<Utc> {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

fn describe_source() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.to_string())
}
