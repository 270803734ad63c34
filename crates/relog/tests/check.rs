//! Integration tests for `relog check`, run through the command parser the
//! way the binary would.

#![allow(clippy::unwrap_used)]

use clap::Parser;
use relog::{Cli, execute};

const VALID: &str = "\
# Changelog

All notable changes to the backend are documented in this file.

## [0.2.0](https://github.com/acme/app/compare/v0.1.0...v0.2.0) (2024-10-12)

### Features

* **api:** report namespace counts ([#21](https://github.com/acme/app/issues/21)) ([8f31c2a](https://github.com/acme/app/commit/8f31c2a))

## [0.1.0](https://github.com/acme/app/releases/tag/v0.1.0) (2024-09-30)

### Features

* initial release
";

fn check(dir: &std::path::Path, content: &str, extra_args: &[&str]) -> miette::Result<()> {
    let path = dir.join("CHANGELOG.md");
    std::fs::write(&path, content).unwrap();
    let mut args = vec![
        "relog".to_string(),
        "check".to_string(),
        "--path".to_string(),
        path.to_string_lossy().into_owned(),
    ];
    args.extend(extra_args.iter().map(ToString::to_string));
    execute(Cli::try_parse_from(args).unwrap())
}

#[test]
fn valid_changelog_passes() {
    let temp_dir = tempfile::tempdir().unwrap();
    assert!(check(temp_dir.path(), VALID, &[]).is_ok());
}

#[test]
fn out_of_order_versions_fail() {
    let temp_dir = tempfile::tempdir().unwrap();
    let broken = "# Changelog\n\n## 0.1.0 (2024-09-30)\n\n## 0.2.0 (2024-10-12)\n";
    assert!(check(temp_dir.path(), broken, &[]).is_err());
}

#[test]
fn warnings_fail_only_strict_runs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let undated = "# Changelog\n\n## 0.1.0\n";
    assert!(check(temp_dir.path(), undated, &[]).is_ok());
    assert!(check(temp_dir.path(), undated, &["--strict"]).is_err());
}

#[test]
fn json_output_still_fails_on_errors() {
    let temp_dir = tempfile::tempdir().unwrap();
    let broken = "# Changelog\n\n## 0.1.0 (2024-09-30)\n\n## 0.1.0 (2024-09-30)\n";
    assert!(check(temp_dir.path(), broken, &["--json"]).is_err());
}

#[test]
fn missing_changelog_is_empty_and_passes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("CHANGELOG.md");
    let path = path.to_string_lossy();
    let args = ["relog", "check", "--path", path.as_ref()];
    assert!(execute(Cli::try_parse_from(args).unwrap()).is_ok());
}
