//! Integration tests for the philtre CLI.
//!
//! These tests verify that the binary behaves correctly: argument
//! parsing, help text, and the show/merge/extract flows against real
//! parameter files.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn philtre() -> Command {
    Command::cargo_bin("philtre").expect("Failed to find philtre binary")
}

struct Fixture {
    #[allow(dead_code)]
    dir: TempDir,
    master: PathBuf,
    user: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let master = dir.path().join("master.phil");
    let user = dir.path().join("user.phil");
    fs::write(
        &master,
        "output {\n  prefix = run\n    .type = str\n    .help = Output file prefix\n}\ncycles = 3\n  .type = int\n",
    )
    .expect("Failed to write master");
    fs::write(&user, "cycles = 10\n").expect("Failed to write user file");
    Fixture { dir, master, user }
}

#[test]
fn test_cli_no_arguments() {
    philtre()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_version_flag() {
    philtre()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("philtre"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_help_flag() {
    philtre()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains(
            "Work with hierarchical parameter files",
        ));
}

#[test]
fn test_show_round_trips_file() {
    let fixture = fixture();
    philtre()
        .arg("show")
        .arg(&fixture.master)
        .assert()
        .success()
        .stdout(predicate::str::contains("output {\n  prefix = run\n}\n"))
        .stdout(predicate::str::contains("cycles = 3"))
        .stdout(predicate::str::contains(".type").not());
}

#[test]
fn test_show_with_attributes() {
    let fixture = fixture();
    philtre()
        .arg("show")
        .arg(&fixture.master)
        .arg("--attributes-level")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains(".type = str"))
        .stdout(predicate::str::contains(".help = \"Output file prefix\""));
}

#[test]
fn test_show_rejects_bad_attributes_level() {
    let fixture = fixture();
    philtre()
        .arg("show")
        .arg(&fixture.master)
        .arg("--attributes-level")
        .arg("9")
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("between 0 and 3"));
}

#[test]
fn test_show_missing_file() {
    philtre()
        .arg("show")
        .arg("no_such_file.phil")
        .assert()
        .failure()
        .code(5);
}

#[test]
fn test_merge_applies_user_values() {
    let fixture = fixture();
    philtre()
        .arg("merge")
        .arg(&fixture.master)
        .arg(&fixture.user)
        .assert()
        .success()
        .stdout(predicate::str::contains("cycles = 10"))
        .stdout(predicate::str::contains("prefix = run"));
}

#[test]
fn test_merge_diff_prints_only_changes() {
    let fixture = fixture();
    philtre()
        .arg("merge")
        .arg("--diff")
        .arg(&fixture.master)
        .arg(&fixture.user)
        .assert()
        .success()
        .stdout(predicate::str::diff("cycles = 10\n"));
}

#[test]
fn test_merge_reports_unused() {
    let fixture = fixture();
    let extra = fixture.dir.path().join("extra.phil");
    fs::write(&extra, "cycles = 7\nmisspelled = 1\n").expect("Failed to write extra file");
    philtre()
        .arg("merge")
        .arg("--show-unused")
        .arg(&fixture.master)
        .arg(&extra)
        .assert()
        .success()
        .stderr(predicate::str::contains("Unused parameter definitions:"))
        .stderr(predicate::str::contains("misspelled"));
}

#[test]
fn test_merge_unused_json_format() {
    let fixture = fixture();
    let extra = fixture.dir.path().join("extra.phil");
    fs::write(&extra, "misspelled = 1\n").expect("Failed to write extra file");
    philtre()
        .arg("merge")
        .arg("--show-unused")
        .arg("--format")
        .arg("json")
        .arg(&fixture.master)
        .arg(&extra)
        .assert()
        .success()
        .stderr(predicate::str::starts_with("[\"misspelled"));
}

#[test]
fn test_merge_quiet_suppresses_unused_report() {
    let fixture = fixture();
    let extra = fixture.dir.path().join("extra.phil");
    fs::write(&extra, "misspelled = 1\n").expect("Failed to write extra file");
    philtre()
        .arg("--quiet")
        .arg("merge")
        .arg("--show-unused")
        .arg(&fixture.master)
        .arg(&extra)
        .assert()
        .success()
        .stderr(predicate::str::contains("misspelled").not());
}

#[test]
fn test_merge_incompatible_input_fails() {
    let fixture = fixture();
    let bad = fixture.dir.path().join("bad.phil");
    fs::write(&bad, "cycles {\n  x = 1\n}\n").expect("Failed to write bad file");
    philtre()
        .arg("merge")
        .arg(&fixture.master)
        .arg(&bad)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("incompatible"));
}

#[test]
fn test_extract_outputs_json() {
    let fixture = fixture();
    philtre()
        .arg("extract")
        .arg(&fixture.master)
        .arg(&fixture.user)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cycles\":10"));
}

#[test]
fn test_extract_master_only_uses_defaults() {
    let fixture = fixture();
    philtre()
        .arg("extract")
        .arg("--pretty")
        .arg(&fixture.master)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cycles\": 3"))
        .stdout(predicate::str::contains("\"prefix\": \"run\""));
}

#[test]
fn test_extract_invalid_value_fails() {
    let fixture = fixture();
    let bad = fixture.dir.path().join("bad.phil");
    fs::write(&bad, "cycles = banana\n").expect("Failed to write bad file");
    philtre()
        .arg("extract")
        .arg(&fixture.master)
        .arg(&bad)
        .assert()
        .failure()
        .code(2);
}
