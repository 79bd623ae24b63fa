//! CLI Integration Tests
//!
//! Tests for `velesync` commands using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the CLI binary command, isolated from any ambient configuration.
#[allow(deprecated)]
fn velesync_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("velesync").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

fn line_count(path: &std::path::Path) -> usize {
    fs::read_to_string(path).unwrap().lines().count()
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    let dir = TempDir::new().unwrap();
    velesync_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VelesSync CLI"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_displays_version() {
    let dir = TempDir::new().unwrap();
    velesync_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("velesync"));
}

#[test]
fn test_invalid_command_shows_error() {
    let dir = TempDir::new().unwrap();
    velesync_cmd(&dir)
        .arg("invalid_command_xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_unknown_scenario_is_rejected() {
    let dir = TempDir::new().unwrap();
    velesync_cmd(&dir)
        .args(["run", "futex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scenario"));
}

// =============================================================================
// Run Command Tests
// =============================================================================

#[test]
fn test_run_each_scenario_writes_one_line_per_worker() {
    for scenario in ["spinlock", "semaphore", "monitor", "barrier", "mutex"] {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");

        velesync_cmd(&dir)
            .args(["run", scenario, "--threads", "4", "--symbols", "8"])
            .arg("--output")
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains(scenario))
            .stdout(predicate::str::contains("lines written"));

        assert_eq!(line_count(&output), 4, "{scenario}");
    }
}

#[test]
fn test_run_rwlock_with_roles_and_priority() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("rw.txt");

    velesync_cmd(&dir)
        .args(["run", "rwlock", "--priority", "fair", "--roles", "w,r,r,w,r"])
        .args(["--min-hold-ms", "0", "--max-hold-ms", "2"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 5);
    assert_eq!(content.matches("wrote:").count(), 2);
    assert_eq!(content.matches("read:").count(), 3);
}

#[test]
fn test_run_json_report() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.txt");

    let assert = velesync_cmd(&dir)
        .args(["run", "monitor", "--threads", "3", "--json"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["scenario"], "monitor");
    assert_eq!(report["threads"], 3);
    assert_eq!(report["timings"].as_array().unwrap().len(), 3);
    assert_eq!(report["peak_concurrency"], 1);
}

#[test]
fn test_run_rejects_zero_threads() {
    let dir = TempDir::new().unwrap();
    velesync_cmd(&dir)
        .args(["run", "spinlock", "--threads", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workload.threads"));
}

#[test]
fn test_run_barrier_break_after() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.txt");

    let assert = velesync_cmd(&dir)
        .args(["run", "barrier", "--threads", "4", "--break-after", "1", "--json"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let kinds: Vec<&str> = report["timings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["outcome"]["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == "broke_barrier").count(), 1);
    assert_eq!(kinds.iter().filter(|k| **k == "barrier_broken").count(), 3);
    assert_eq!(line_count(&output), 4);
}

#[test]
fn test_run_range_search_reports_both_passes() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("search.txt");

    velesync_cmd(&dir)
        .args(["run", "range-search", "--threads", "4", "--records", "10000"])
        .args(["--from", "2000-01-01", "--to", "2020-12-31"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Single-threaded"))
        .stdout(predicate::str::contains("Multi-threaded"));

    assert_eq!(line_count(&output), 4);
}

#[test]
fn test_run_range_search_json() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("search.txt");

    let assert = velesync_cmd(&dir)
        .args(["run", "range_search", "--threads", "3", "--records", "5000", "--json"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let search = &report["search"];
    assert_eq!(search["records"], 5000);
    assert_eq!(search["sequential_matches"], search["parallel_matches"]);
    assert!(search["sequential_secs"].is_number());
    assert!(search["parallel_secs"].is_number());
    assert_eq!(report["violations"], 0);
}

#[test]
fn test_run_range_search_rejects_malformed_date() {
    let dir = TempDir::new().unwrap();
    velesync_cmd(&dir)
        .args(["run", "range-search", "--from", "2000-02-30x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_show_reads_file_and_env() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("velesync.toml"), "[workload]\nthreads = 3\n").unwrap();

    velesync_cmd(&dir)
        .args(["config", "show"])
        .env("VELESYNC_SEMAPHORE__PERMITS", "5")
        .assert()
        .success()
        .stdout(predicate::str::contains("threads = 3"))
        .stdout(predicate::str::contains("permits = 5"));
}

#[test]
fn test_config_validate_accepts_defaults() {
    let dir = TempDir::new().unwrap();
    velesync_cmd(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn test_config_validate_reports_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[rwlock]\nmin_hold_ms = 9\nmax_hold_ms = 1\n").unwrap();

    velesync_cmd(&dir)
        .arg("--config")
        .arg(&path)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rwlock.min_hold_ms"));
}

#[test]
fn test_config_validate_rejects_zero_permits() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("velesync.toml"), "[semaphore]\npermits = 0\n").unwrap();

    velesync_cmd(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("semaphore.permits"));
}
