//! CLI test cases.
//!
//! Tests which need Poppler, Tesseract's Thai language data, or network
//! access to the translation service are marked `#[ignore]`.

use std::{fs, process::Command};

use assert_cmd::prelude::*;
use predicates::prelude::*;

/// Create a new `Command` with our binary.
fn cmd() -> Command {
    Command::cargo_bin("thai-scan-translator").unwrap()
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--all-pages"));
}

#[test]
fn test_version() {
    cmd().arg("--version").assert().success();
}

#[test]
fn test_missing_single_file_fails() {
    let tmpdir = tempfile::TempDir::new().unwrap();
    cmd()
        .current_dir(tmpdir.path())
        .arg("no-such-book.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_batch_mode_skips_missing_files() {
    let tmpdir = tempfile::TempDir::new().unwrap();
    cmd()
        .current_dir(tmpdir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping Vithisangaha.pdf: not found"))
        .stdout(predicate::str::contains("No PDF files to translate."));
    assert!(!tmpdir.path().join("translations").exists());
}

#[test]
fn test_all_pages_conflicts_with_path() {
    cmd().arg("book.pdf").arg("--all-pages").assert().failure();
}

#[test]
#[ignore = "Needs poppler-utils, tesseract-ocr-tha and network access"]
fn test_translate_fixture() {
    let tmpdir = tempfile::TempDir::new().unwrap();
    let fixture = fs::canonicalize("tests/fixtures/three_pages.pdf").unwrap();
    cmd()
        .current_dir(tmpdir.path())
        .arg(&fixture)
        .arg("2")
        .assert()
        .success();

    let json =
        fs::read_to_string(tmpdir.path().join("translations/three_pages_translation.json"))
            .unwrap();
    let result: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(result["total_pages"], 3);
    assert_eq!(result["processed_pages"], 2);
    assert_eq!(result["pages"].as_array().unwrap().len(), 2);
    assert!(tmpdir.path().join("translations/three_pages_english.txt").exists());
    assert!(tmpdir.path().join("translations/three_pages_translation.txt").exists());
}
