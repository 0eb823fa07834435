//! Common test utilities for divvy integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's real data directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `workspace_dir`: acts as the tracked workspace
/// - `data_dir`: holds divvy's data (via the `DV_DATA_DIR` env var)
///
/// The `dv()` method returns a `Command` that sets `DV_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub workspace_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            workspace_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize divvy.
    pub fn init() -> Self {
        let env = Self::new();
        env.dv().args(["system", "init"]).assert().success();
        env
    }

    /// Get a Command for the dv binary with isolated data directory.
    pub fn dv(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dv"));
        cmd.current_dir(self.workspace_dir.path());
        cmd.env("DV_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Run a dv command and parse its stdout as JSON.
    pub fn dv_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.dv().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Create a partner and return its id.
    pub fn add_partner(&self, name: &str, user: &str) -> String {
        let v = self.dv_json(&["partner", "add", name, "--user", user]);
        v["id"].as_str().unwrap().to_string()
    }

    /// Create a project and return its id.
    pub fn add_project(&self, name: &str, value: &str) -> String {
        let v = self.dv_json(&["project", "create", name, "--value", value]);
        v["id"].as_str().unwrap().to_string()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
