//! Divvy - partnership project tracking and profit sharing.
//!
//! This library provides the core functionality for the `dv` CLI tool:
//! partner, project, task and transaction management, plus the derived
//! financial layer - contribution attribution, profit splitting,
//! financial snapshots, payouts, and capital-proportional equity.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod engine;
pub mod models;
pub mod storage;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use tempfile::TempDir;

    use crate::storage::Storage;

    /// Test environment with isolated storage using dependency injection.
    ///
    /// Each `TestEnv` creates two temporary directories:
    /// - `workspace_dir`: acts as the tracked workspace
    /// - `data_dir`: holds divvy's data, passed explicitly so tests never
    ///   touch the user's real data directory
    pub struct TestEnv {
        /// Simulated workspace directory
        pub workspace_dir: TempDir,
        /// Isolated data storage directory
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

        /// Get the path to the simulated workspace.
        pub fn path(&self) -> &Path {
            self.workspace_dir.path()
        }

        /// Get the path to the isolated data directory.
        pub fn data_path(&self) -> &Path {
            self.data_dir.path()
        }

        /// Initialize storage for this test environment.
        pub fn init_storage(&self) -> Storage {
            Storage::init_with_data_dir(self.path(), self.data_path()).unwrap()
        }

        /// Open storage for this test environment.
        pub fn open_storage(&self) -> Storage {
            Storage::open_with_data_dir(self.path(), self.data_path()).unwrap()
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for Divvy operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not initialized: run `dv system init` first")]
    NotInitialized,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Divvy operations.
pub type Result<T> = std::result::Result<T, Error>;
