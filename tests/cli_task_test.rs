//! Integration tests for task commands via CLI.
//!
//! Task mutations also trigger a financial sync, so these tests check
//! the derived contribution set where it matters.

mod common;

use common::TestEnv;
use predicates::prelude::*;

fn setup_project(env: &TestEnv) -> (String, String, String) {
    let p1 = env.add_partner("Asha", "asha");
    let p2 = env.add_partner("Ben", "ben");
    let project = env.add_project("Relaunch", "24000");
    env.dv_json(&["project", "weight", &project, "execution", "100"]);
    (project, p1, p2)
}

// === Create Tests ===

#[test]
fn test_task_create_json() {
    let env = TestEnv::init();
    let (project, p1, _) = setup_project(&env);

    env.dv()
        .args([
            "task", "create", &project, "Build the thing", "-c", "execution", "-e", "5", "-a", &p1,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\":\"dvt-"))
        .stdout(predicate::str::contains("\"status\":\"backlog\""))
        .stdout(predicate::str::contains("\"effort_weight\":5.0"));
}

#[test]
fn test_task_create_updates_contributions() {
    let env = TestEnv::init();
    let (project, p1, p2) = setup_project(&env);

    env.dv_json(&[
        "task", "create", &project, "Big", "-c", "execution", "-e", "7", "-a", &p1,
    ]);
    env.dv_json(&[
        "task", "create", &project, "Small", "-c", "execution", "-e", "3", "-a", &p2,
    ]);

    let v = env.dv_json(&["contrib", "list", &project]);
    let contributions = v["contributions"].as_array().unwrap();
    assert_eq!(contributions.len(), 2);
    let pct_of = |id: &str| -> f64 {
        contributions
            .iter()
            .find(|c| c["partner_id"].as_str().unwrap() == id)
            .unwrap()["percentage"]
            .as_f64()
            .unwrap()
    };
    assert_eq!(pct_of(&p1), 70.0);
    assert_eq!(pct_of(&p2), 30.0);
}

#[test]
fn test_task_create_zero_effort_rejected() {
    let env = TestEnv::init();
    let (project, _, _) = setup_project(&env);

    env.dv()
        .args(["task", "create", &project, "Nothing", "-e", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Effort weight must be positive"));
}

#[test]
fn test_task_create_unknown_assignee_rejected() {
    let env = TestEnv::init();
    let (project, _, _) = setup_project(&env);

    env.dv()
        .args(["task", "create", &project, "Orphan", "-a", "dvp-0000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Partner not found"));
}

// === Update Tests ===

#[test]
fn test_task_update_status() {
    let env = TestEnv::init();
    let (project, p1, _) = setup_project(&env);
    let v = env.dv_json(&[
        "task", "create", &project, "Build", "-c", "execution", "-e", "2", "-a", &p1,
    ]);
    let task = v["id"].as_str().unwrap().to_string();

    env.dv()
        .args(["task", "update", &task, "-s", "in_progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"in_progress\""));
}

#[test]
fn test_task_update_completion_credit_moves_contribution() {
    let env = TestEnv::init();
    let (project, p1, p2) = setup_project(&env);
    let v = env.dv_json(&[
        "task", "create", &project, "Build", "-c", "execution", "-e", "2", "-a", &p1,
    ]);
    let task = v["id"].as_str().unwrap().to_string();

    // Done and completed by ben: the credit moves to ben's partner.
    env.dv_json(&["task", "update", &task, "-s", "done", "--completed-by", "ben"]);

    let v = env.dv_json(&["contrib", "list", &project]);
    let contributions = v["contributions"].as_array().unwrap();
    assert_eq!(contributions.len(), 1);
    assert_eq!(contributions[0]["partner_id"].as_str().unwrap(), p2);
    assert_eq!(contributions[0]["percentage"].as_f64().unwrap(), 100.0);
}

#[test]
fn test_task_update_bad_status_rejected() {
    let env = TestEnv::init();
    let (project, _, _) = setup_project(&env);
    let v = env.dv_json(&["task", "create", &project, "Build", "-e", "2"]);
    let task = v["id"].as_str().unwrap().to_string();

    env.dv()
        .args(["task", "update", &task, "-s", "cancelled"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown task status"));
}

// === List / Delete Tests ===

#[test]
fn test_task_list_with_status_filter() {
    let env = TestEnv::init();
    let (project, p1, _) = setup_project(&env);
    let v = env.dv_json(&[
        "task", "create", &project, "Build", "-c", "execution", "-e", "2", "-a", &p1,
    ]);
    let task = v["id"].as_str().unwrap().to_string();
    env.dv_json(&["task", "create", &project, "Plan", "-e", "1"]);
    env.dv_json(&["task", "update", &task, "-s", "done"]);

    let v = env.dv_json(&["task", "list", &project]);
    assert_eq!(v["tasks"].as_array().unwrap().len(), 2);

    let v = env.dv_json(&["task", "list", &project, "--status", "done"]);
    assert_eq!(v["tasks"].as_array().unwrap().len(), 1);
}

#[test]
fn test_task_delete_updates_contributions() {
    let env = TestEnv::init();
    let (project, p1, p2) = setup_project(&env);
    env.dv_json(&[
        "task", "create", &project, "Keep", "-c", "execution", "-e", "7", "-a", &p1,
    ]);
    let v = env.dv_json(&[
        "task", "create", &project, "Drop", "-c", "execution", "-e", "3", "-a", &p2,
    ]);
    let task = v["id"].as_str().unwrap().to_string();

    env.dv()
        .args(["task", "delete", &task])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deleted\""));

    let v = env.dv_json(&["contrib", "list", &project]);
    let contributions = v["contributions"].as_array().unwrap();
    assert_eq!(contributions.len(), 1);
    assert_eq!(contributions[0]["partner_id"].as_str().unwrap(), p1);
}
