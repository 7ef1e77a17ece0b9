//! End-to-end CLI tests for the bookfetch binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config, credentials, and download folder.
fn bookfetch(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bookfetch").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env("BOOKFETCH_OUTPUT_DIR", home.path().join("out"))
        .env_remove("BOOKFETCH_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    bookfetch(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Find a book"))
        .stdout(predicate::str::contains("--index"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    bookfetch(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bookfetch"));
}

#[test]
fn test_binary_without_query_is_usage_error() {
    let home = TempDir::new().unwrap();
    bookfetch(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("<QUERY>"));
}

#[test]
fn test_blank_query_fails_before_any_request() {
    let home = TempDir::new().unwrap();
    bookfetch(&home)
        .arg("   ")
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid input"))
        .stdout(predicate::str::contains("Why:"))
        .stdout(predicate::str::contains("Fix:"));
    assert!(!home.path().join("out").exists());
}

#[test]
fn test_unknown_format_is_invalid_input_with_debug_payload() {
    let home = TempDir::new().unwrap();
    bookfetch(&home)
        .args(["Atomic Habits", "--format", "cbz", "--debug"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid input"))
        .stderr(predicate::str::contains("InvalidInput"));
}

#[test]
fn test_invalid_config_file_aborts() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("bookfetch");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "metadata_timeout_secs = 0\n").unwrap();

    bookfetch(&home)
        .arg("Atomic Habits")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}
