//! CLI binary smoke tests using assert_cmd.
//!
//! These tests run the compiled `agro` binary end to end: argument parsing,
//! help text, training and JSON output.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("agro").unwrap()
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("crop"))
        .stdout(predicate::str::contains("yield"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("agro"));
}

// ---------------------------------------------------------------------------
// crop
// ---------------------------------------------------------------------------

#[test]
fn crop_requires_fields_or_input() {
    cmd()
        .args(["crop", "--nitrogen", "90"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn crop_single_record_prints_json() {
    cmd()
        .args([
            "crop",
            "--nitrogen",
            "90",
            "--phosphorus",
            "42",
            "--potassium",
            "43",
            "--temperature",
            "20.9",
            "--humidity",
            "82",
            "--ph",
            "6.5",
            "--rainfall",
            "202.9",
            "--seed",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"task\": \"crop\""))
        .stdout(predicate::str::contains("suitability_score"));
}

// ---------------------------------------------------------------------------
// yield
// ---------------------------------------------------------------------------

#[test]
fn yield_from_csv_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("farms.csv");
    let output = dir.path().join("out.json");
    std::fs::write(
        &input,
        "season,state,area,annual_rainfall,fertilizer,pesticides\n\
         Kharif,Punjab,10,1000,80,8\n",
    )
    .unwrap();

    cmd()
        .arg("yield")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--seed", "2"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("predicted_yield"));
    assert!(written.contains("recommendations"));
}

#[test]
fn yield_rejects_unsupported_input_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("farms.txt");
    std::fs::write(&input, "area\n10\n").unwrap();

    cmd()
        .arg("yield")
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains(".tsv or .csv"));
}
