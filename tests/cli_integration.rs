//! Integration tests for the adrman CLI
//!
//! These tests run the real binary inside a temporary working directory.
//! They verify that commands work end-to-end without mocking.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run adrman in `dir` with colours off and HOME pointed at `dir`
fn run_adrman(args: &[&str], dir: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_adrman"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("EDITOR")
        .output()
        .expect("Failed to execute adrman")
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Temp dir with an initialized repository (first record included)
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    let output = run_adrman(&["init"], dir.path());
    assert!(output.status.success(), "init failed: {}", stderr(&output));
    dir
}

fn record_path(dir: &TempDir, name: &str) -> std::path::PathBuf {
    dir.path().join("docs/adr").join(name)
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_adrman"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("adrman"));
    assert!(out.contains("decision records"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_adrman"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("adrman"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let dir = TempDir::new().unwrap();
    let output = run_adrman(&["completion", "zsh"], dir.path());

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    assert!(
        stdout(&output).contains("#compdef adrman"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_bash() {
    let dir = TempDir::new().unwrap();
    let output = run_adrman(&["completion", "bash"], dir.path());

    assert!(output.status.success());
    assert!(stdout(&output).contains("_adrman"));
}

// =============================================================================
// Repository Workflow Tests
// =============================================================================

#[test]
fn test_init_creates_first_record_and_toc() {
    let dir = initialized();

    assert!(dir.path().join(".adr.json").is_file());
    assert!(record_path(&dir, "template-short.md").is_file());
    assert!(record_path(&dir, "template-long.md").is_file());
    assert!(record_path(&dir, "0001-record-architecture-decisions.md").is_file());

    let toc = fs::read_to_string(record_path(&dir, "README.md")).unwrap();
    assert!(toc.starts_with("# Architecture Decision Records\n"));
    assert!(toc.contains("[1. Record architecture decisions]"));
}

#[test]
fn test_init_twice_fails() {
    let dir = initialized();
    let output = run_adrman(&["init"], dir.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("already initialized"));
}

#[test]
fn test_init_with_options() {
    let dir = TempDir::new().unwrap();
    let output = run_adrman(
        &[
            "init",
            "--path",
            "decisions",
            "--prefix",
            "ADR-",
            "--digits",
            "3",
            "--no-first-record",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "init failed: {}", stderr(&output));

    let output = run_adrman(&["new", "Use", "a", "queue"], dir.path());
    assert!(output.status.success(), "new failed: {}", stderr(&output));
    assert!(stdout(&output).contains("decisions/ADR-001-use-a-queue.md"));

    let raw = fs::read_to_string(dir.path().join("decisions/ADR-001-use-a-queue.md")).unwrap();
    assert!(raw.starts_with("# 001. Use a queue\n"));
}

#[test]
fn test_commands_outside_repository_fail() {
    let dir = TempDir::new().unwrap();
    let output = run_adrman(&["list"], dir.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("adrman init"));
}

#[test]
fn test_new_and_list() {
    let dir = initialized();

    let output = run_adrman(&["new", "Use PostgreSQL"], dir.path());
    assert!(output.status.success(), "new failed: {}", stderr(&output));
    assert!(record_path(&dir, "0002-use-postgresql.md").is_file());

    let output = run_adrman(&["list"], dir.path());
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Record architecture decisions"));
    assert!(out.contains("Accepted"));
    assert!(out.contains("Use PostgreSQL"));
    assert!(out.contains("Proposed"));

    let toc = fs::read_to_string(record_path(&dir, "README.md")).unwrap();
    assert!(toc.contains("[2. Use PostgreSQL](docs/adr/0002-use-postgresql.md)"));
}

#[test]
fn test_status_and_logs() {
    let dir = initialized();
    run_adrman(&["new", "Cache responses"], dir.path());

    let output = run_adrman(&["status", "2", "Accepted"], dir.path());
    assert!(output.status.success(), "status failed: {}", stderr(&output));

    let output = run_adrman(&["logs", "2"], dir.path());
    assert!(output.status.success());
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Proposed"));
    assert!(lines[1].contains("Accepted"));
}

#[test]
fn test_status_prompt_reads_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let dir = initialized();
    let mut child = Command::new(env!("CARGO_BIN_EXE_adrman"))
        .args(["status", "1"])
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute adrman");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"5\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "status failed: {}", stderr(&output));

    let raw = fs::read_to_string(record_path(&dir, "0001-record-architecture-decisions.md")).unwrap();
    assert!(raw.contains(" Superseded\n"));
}

#[test]
fn test_status_rejects_blank_label() {
    let dir = initialized();
    let path = record_path(&dir, "0001-record-architecture-decisions.md");
    let before = fs::read_to_string(&path).unwrap();

    let output = run_adrman(&["status", "1", "  "], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid status"));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_init_rejects_zero_digits() {
    let dir = TempDir::new().unwrap();
    let output = run_adrman(&["init", "--digits", "0"], dir.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("digits must be at least 1"));
    assert!(!dir.path().join(".adr.json").exists());
}

#[test]
fn test_status_unknown_index() {
    let dir = initialized();
    let output = run_adrman(&["status", "42", "Done"], dir.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("42"));
}

#[test]
fn test_invalid_index_argument() {
    let dir = initialized();
    let output = run_adrman(&["logs", "abc"], dir.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("not a valid record index"));
}

#[test]
fn test_search() {
    let dir = initialized();
    run_adrman(&["new", "Use Redis for caching"], dir.path());
    run_adrman(&["new", "Use Kafka"], dir.path());

    let output = run_adrman(&["search", "redis"], dir.path());
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("0002-use-redis-for-caching.md"));
    assert!(!out.contains("0003-use-kafka.md"));

    let output = run_adrman(&["search", "--case-sensitive", "redis"], dir.path());
    assert!(!stdout(&output).contains("0002"));

    let output = run_adrman(&["search", "(broken"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid search keyword"));
}

#[test]
fn test_update_renames_files() {
    let dir = initialized();
    run_adrman(&["new", "Old name"], dir.path());

    let path = record_path(&dir, "0002-old-name.md");
    let raw = fs::read_to_string(&path).unwrap();
    fs::write(&path, raw.replace("# 0002. Old name", "# 0002. Better name")).unwrap();

    let output = run_adrman(&["update"], dir.path());
    assert!(output.status.success());
    assert!(stdout(&output).contains("0002-better-name.md"));
    assert!(record_path(&dir, "0002-better-name.md").is_file());
    assert!(!path.exists());
}

#[test]
fn test_export_formats() {
    let dir = initialized();

    let output = run_adrman(&["export", "csv"], dir.path());
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("Index,Decision,Last Modified Date,Last Status\n"));
    assert!(out.contains("0001,Record architecture decisions,"));

    let output = run_adrman(&["export", "json"], dir.path());
    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(value[0]["decision"], "Record architecture decisions");
    assert_eq!(value[0]["lastStatus"], "Accepted");

    let output = run_adrman(&["export", "html", "--store"], dir.path());
    assert!(output.status.success());
    let html = fs::read_to_string(dir.path().join("export.html")).unwrap();
    assert!(html.contains("Record architecture decisions"));

    let output = run_adrman(&["export", "markdown"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not supported"));
}

#[test]
fn test_toc_regenerates_after_manual_delete() {
    let dir = initialized();
    fs::remove_file(record_path(&dir, "README.md")).unwrap();

    let output = run_adrman(&["toc"], dir.path());
    assert!(output.status.success());
    assert!(record_path(&dir, "README.md").is_file());
}

#[test]
fn test_config_round_trip() {
    let dir = TempDir::new().unwrap();
    let output = run_adrman(&["config", "--editor", "nano"], dir.path());
    assert!(output.status.success(), "config failed: {}", stderr(&output));

    let stored = fs::read_to_string(dir.path().join(".adrman.toml")).unwrap();
    assert!(stored.contains("editor = \"nano\""));

    let output = run_adrman(&["config"], dir.path());
    assert!(stdout(&output).contains("nano"));
}

#[test]
fn test_edit_without_editor_fails() {
    let dir = initialized();
    let output = run_adrman(&["edit", "1"], dir.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no editor configured"));
}
