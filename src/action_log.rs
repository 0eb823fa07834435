//! Action logging for Divvy commands.
//!
//! Every CLI invocation is appended to a JSONL log file under the data
//! root. For a tool that moves money figures around, the trail of who
//! ran what, when, and whether it succeeded is part of the audit story.
//!
//! Logging must never break a command: failures here are reported as
//! warnings on stderr and otherwise swallowed.

use crate::storage::data_root;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Represents a single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Workspace path where the command was executed
    pub workspace: String,

    /// Command name (e.g., "task create", "capital inject")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Log an action to the log file.
///
/// Never fails: any error is downgraded to a stderr warning so commands
/// are not broken by logging issues.
pub fn log_action(
    workspace: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    let log_path = match log_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Warning: Failed to resolve action log path: {}", e);
            return;
        }
    };

    let entry = ActionLog {
        timestamp: Utc::now(),
        workspace: workspace.to_string_lossy().to_string(),
        command: command.to_string(),
        args,
        success,
        error,
        duration_ms,
        user: current_user(),
    };

    if let Err(e) = write_log_entry(&log_path, &entry) {
        eprintln!("Warning: Failed to write action log: {}", e);
    }
}

/// Read the most recent `limit` entries, newest first.
pub fn read_recent(limit: usize) -> Result<Vec<ActionLog>> {
    let log_path = log_path()?;
    if !log_path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(&log_path)?;
    let reader = BufReader::new(file);

    let mut entries: Vec<ActionLog> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        // Tolerate malformed lines; the log is best-effort.
        if let Ok(entry) = serde_json::from_str::<ActionLog>(&line) {
            entries.push(entry);
        }
    }

    entries.reverse();
    entries.truncate(limit);
    Ok(entries)
}

/// The action log lives beside the per-workspace databases.
fn log_path() -> Result<PathBuf> {
    Ok(data_root()?.join("action.log"))
}

fn write_log_entry(path: &Path, entry: &ActionLog) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
