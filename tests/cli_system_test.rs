//! Integration tests for system commands via CLI.
//!
//! These tests verify that:
//! - `dv system init` creates the storage and is idempotent
//! - `dv system version` reports build information
//! - commands against an uninitialized workspace fail with a hint

mod common;

use common::TestEnv;
use predicates::prelude::*;

// === Init Tests ===

#[test]
fn test_init_creates_storage() {
    let env = TestEnv::new();

    env.dv()
        .args(["system", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"initialized\":true"));
}

#[test]
fn test_init_human_readable() {
    let env = TestEnv::new();

    env.dv()
        .args(["system", "init", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized divvy"));
}

#[test]
fn test_init_already_initialized() {
    let env = TestEnv::init();

    env.dv()
        .args(["system", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"initialized\":false"));
}

// === Version Tests ===

#[test]
fn test_version_json() {
    let env = TestEnv::new();

    env.dv()
        .args(["system", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\":\"0.1.0\""))
        .stdout(predicate::str::contains("build_timestamp"));
}

#[test]
fn test_version_human() {
    let env = TestEnv::new();

    env.dv()
        .args(["system", "version", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dv 0.1.0"));
}

// === Uninitialized Tests ===

#[test]
fn test_uninitialized_command_fails_with_hint() {
    let env = TestEnv::new();

    env.dv()
        .args(["partner", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not initialized"));
}

#[test]
fn test_uninitialized_error_is_json_by_default() {
    let env = TestEnv::new();

    env.dv()
        .args(["partner", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("{\"error\""));
}

#[test]
fn test_missing_workspace_path_rejected() {
    let env = TestEnv::new();

    env.dv()
        .args(["-C", "/nonexistent/path/zz", "partner", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
