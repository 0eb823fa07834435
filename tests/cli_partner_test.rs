//! Integration tests for partner commands via CLI.

mod common;

use common::TestEnv;
use predicates::prelude::*;

// === Add Tests ===

#[test]
fn test_partner_add_json() {
    let env = TestEnv::init();

    env.dv()
        .args(["partner", "add", "Asha", "--user", "asha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\":\"dvp-"))
        .stdout(predicate::str::contains("\"user_id\":\"asha\""))
        .stdout(predicate::str::contains("\"equity_percentage\":0.0"));
}

#[test]
fn test_partner_add_human() {
    let env = TestEnv::init();

    env.dv()
        .args(["-H", "partner", "add", "Asha", "--user", "asha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Partner dvp-"))
        .stdout(predicate::str::contains("\"Asha\""));
}

#[test]
fn test_partner_add_duplicate_user_rejected() {
    let env = TestEnv::init();
    env.add_partner("Asha", "asha");

    env.dv()
        .args(["partner", "add", "Asha Again", "--user", "asha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already owns partner"));
}

#[test]
fn test_partner_add_empty_name_rejected() {
    let env = TestEnv::init();

    env.dv()
        .args(["partner", "add", "  ", "--user", "asha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

// === List / Show Tests ===

#[test]
fn test_partner_list() {
    let env = TestEnv::init();
    env.add_partner("Asha", "asha");
    env.add_partner("Ben", "ben");

    let v = env.dv_json(&["partner", "list"]);
    assert_eq!(v["partners"].as_array().unwrap().len(), 2);
}

#[test]
fn test_partner_show() {
    let env = TestEnv::init();
    let id = env.add_partner("Asha", "asha");

    env.dv()
        .args(["partner", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"Asha\""));
}

#[test]
fn test_partner_show_unknown() {
    let env = TestEnv::init();

    env.dv()
        .args(["partner", "show", "dvp-0000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Partner not found"));
}

#[test]
fn test_partner_show_invalid_id() {
    let env = TestEnv::init();

    env.dv()
        .args(["partner", "show", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ID must start with"));
}
