//! Integration tests for ledger transaction commands via CLI.

mod common;

use common::TestEnv;
use predicates::prelude::*;

fn setup_project(env: &TestEnv) -> String {
    env.add_project("Relaunch", "24000")
}

// === Add Tests ===

#[test]
fn test_tx_add_income_json() {
    let env = TestEnv::init();
    let project = setup_project(&env);

    env.dv()
        .args(["tx", "add", &project, "500", "-k", "income", "-c", "milestone-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\":\"dvx-"))
        .stdout(predicate::str::contains("\"kind\":\"income\""))
        .stdout(predicate::str::contains("\"amount\":500.0"));
}

#[test]
fn test_tx_add_with_date() {
    let env = TestEnv::init();
    let project = setup_project(&env);

    env.dv()
        .args(["tx", "add", &project, "500", "-k", "income", "-d", "2026-02-14"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"date\":\"2026-02-14\""));
}

#[test]
fn test_tx_add_bad_kind_rejected() {
    let env = TestEnv::init();
    let project = setup_project(&env);

    env.dv()
        .args(["tx", "add", &project, "500", "-k", "transfer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown transaction kind"));
}

#[test]
fn test_tx_add_bad_date_rejected() {
    let env = TestEnv::init();
    let project = setup_project(&env);

    env.dv()
        .args(["tx", "add", &project, "500", "-k", "income", "-d", "14/02/2026"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_tx_add_zero_amount_rejected() {
    let env = TestEnv::init();
    let project = setup_project(&env);

    env.dv()
        .args(["tx", "add", &project, "0", "-k", "income"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be positive"));
}

// === List Tests ===

#[test]
fn test_tx_list_balance() {
    let env = TestEnv::init();
    let project = setup_project(&env);
    env.dv_json(&["tx", "add", &project, "1000", "-k", "income"]);
    env.dv_json(&["tx", "add", &project, "300", "-k", "expense"]);

    let v = env.dv_json(&["tx", "list", &project]);
    assert_eq!(v["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(v["balance"].as_f64().unwrap(), 700.0);
}

// === Delete Tests ===

#[test]
fn test_tx_delete_resyncs_snapshot() {
    let env = TestEnv::init();
    let project = setup_project(&env);
    env.dv_json(&["tx", "add", &project, "1000", "-k", "income"]);
    let v = env.dv_json(&["tx", "add", &project, "300", "-k", "expense"]);
    let tx = v["id"].as_str().unwrap().to_string();

    // The snapshot reflects both entries, then just the remaining one.
    let v = env.dv_json(&["financial", "show", &project]);
    assert_eq!(v["actual_balance"].as_f64().unwrap(), 700.0);

    env.dv_json(&["tx", "delete", &tx]);
    let v = env.dv_json(&["financial", "show", &project]);
    assert_eq!(v["actual_balance"].as_f64().unwrap(), 1000.0);
}

#[test]
fn test_tx_delete_unknown() {
    let env = TestEnv::init();
    setup_project(&env);

    env.dv()
        .args(["tx", "delete", "dvx-0000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Transaction not found"));
}
