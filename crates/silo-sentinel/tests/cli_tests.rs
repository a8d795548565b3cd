//! Integration tests for the `silo-sentinel` CLI binary.
//!
//! These exercise the CLI as a subprocess, verifying exit codes and
//! output. They do NOT require a running Safe server — every command is
//! pointed at a closed port and expected to fail cleanly.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::Command;

/// Locate the `silo-sentinel` binary built by `cargo test`.
fn sentinel_bin() -> String {
    let path = env!("CARGO_BIN_EXE_silo-sentinel");
    assert!(
        Path::new(path).exists(),
        "silo-sentinel binary not found at {path}"
    );
    path.to_owned()
}

/// Run silo-sentinel with args and return (`exit_code`, stdout, stderr).
fn run(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(sentinel_bin())
        .args(args)
        .env("SILO_SAFE_URL", "http://127.0.0.1:19999") // Non-existent server
        .env_remove("SILO_PEER_ID")
        .output()
        .expect("failed to execute silo-sentinel");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0, "silo-sentinel --version should exit 0");
    assert!(
        stdout.contains("silo-sentinel"),
        "version output should contain 'silo-sentinel': {stdout}"
    );
}

#[test]
fn test_help_lists_all_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0, "silo-sentinel --help should exit 0");
    for cmd in ["status", "get", "set", "delete"] {
        assert!(stdout.contains(cmd), "help should list '{cmd}' command");
    }
    assert!(
        stdout.contains("SILO_SAFE_URL"),
        "help should document the server address variable"
    );
}

#[test]
fn test_subcommand_help() {
    for sub in ["status", "get", "set", "delete"] {
        let (code, stdout, _) = run(&[sub, "--help"]);
        assert_eq!(code, 0, "{sub} --help should exit 0");
        assert!(!stdout.is_empty(), "{sub} --help should produce output");
    }
}

// ── Argument validation (no server contact) ──────────────────────────

#[test]
fn test_set_requires_value() {
    let (code, _, stderr) = run(&["set", "billing"]);
    assert_ne!(code, 0, "set without --value should fail");
    assert!(
        stderr.contains("--value") || stderr.contains("required"),
        "should report the missing value flag: {stderr}"
    );
}

#[test]
fn test_delete_requires_workload_id() {
    let (code, _, stderr) = run(&["delete"]);
    assert_ne!(code, 0, "delete without workload ids should fail");
    assert!(
        stderr.contains("required") || stderr.contains("WORKLOAD_IDS"),
        "should report missing workload ids: {stderr}"
    );
}

// ── Unreachable server ───────────────────────────────────────────────

#[test]
fn test_status_fails_cleanly_when_unreachable() {
    let (code, _, stderr) = run(&["status"]);
    assert_ne!(code, 0, "status against a closed port should fail");
    assert!(
        stderr.contains("Error"),
        "failure should be reported on stderr: {stderr}"
    );
    assert!(
        stderr.contains("request failed"),
        "should carry the connectivity context: {stderr}"
    );
}

#[test]
fn test_delete_fails_cleanly_when_unreachable() {
    let (code, _, stderr) = run(&["delete", "billing"]);
    assert_ne!(code, 0, "delete against a closed port should fail");
    assert!(
        stderr.contains("request failed"),
        "should carry the connectivity context: {stderr}"
    );
}
