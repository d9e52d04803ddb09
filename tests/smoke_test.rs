//! Smoke tests for the bibvault CLI.
//!
//! These tests verify basic CLI functionality:
//! - `bibvault --version` outputs version info
//! - `bibvault --help` outputs help text
//! - `bibvault print-default-config` outputs every supported format

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the bibvault binary.
fn bibvault() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bibvault"))
}

#[test]
fn test_version_flag() {
    bibvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bibvault"))
        .stdout(predicate::str::contains("0.1.0"))
        .stdout(predicate::str::contains("commit"))
        .stdout(predicate::str::is_match(r"built \d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z").unwrap());
}

#[test]
fn test_help_flag() {
    bibvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("print-default-config"))
        .stdout(predicate::str::contains("frontmatter"));
}

#[test]
fn test_help_subcommand() {
    bibvault()
        .args(["help", "generate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--vault-loc"))
        .stdout(predicate::str::contains("--updated-policy"));
}

#[test]
fn test_no_args_is_usage_error() {
    bibvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_print_default_config_json() {
    let output = bibvault()
        .arg("print-default-config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["bib_filename"], "refs.bib");
    assert_eq!(json["vault_loc"], "vault/");
    assert_eq!(json["note_prefix"], "refs.");
    assert_eq!(json["make_tag_notes"], true);
    assert_eq!(json["updated_policy"], "preserve");
    assert!(json["template_path"].is_null());
}

#[test]
fn test_print_default_config_yaml() {
    bibvault()
        .args(["print-default-config", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("note_prefix: refs."))
        .stdout(predicate::str::contains("kebab_case_tag_names: false"));
}

#[test]
fn test_print_default_config_toml() {
    bibvault()
        .args(["print-default-config", "--format", "toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("note_prefix = \"refs.\""));
}

#[test]
fn test_print_default_config_rejects_unknown_format() {
    bibvault()
        .args(["print-default-config", "--format", "ini"])
        .assert()
        .failure();
}
