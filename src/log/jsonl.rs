//! Role selection history as JSON Lines
//!
//! Every change of the active role selection appends one [`RoleChange`] to
//! `<state_dir>/role_changes.jsonl`. The file is never rewritten.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write as IoWrite};
use std::path::{Path, PathBuf};

const HISTORY_FILE: &str = "role_changes.jsonl";

/// A single change of the active role selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleChange {
    /// When the change happened (UTC)
    pub timestamp: DateTime<Utc>,
    /// Storage key of the selection that changed
    pub storage_key: String,
    /// The selection after the change
    pub selected: Vec<String>,
}

impl RoleChange {
    /// Record a change happening now
    #[must_use]
    pub fn now(storage_key: &str, selected: &[String]) -> Self {
        Self {
            timestamp: Utc::now(),
            storage_key: storage_key.to_string(),
            selected: selected.to_vec(),
        }
    }
}

/// Append-only history of role selection changes
#[derive(Debug, Clone)]
pub struct RoleHistory {
    path: PathBuf,
}

impl RoleHistory {
    /// Open the history kept in `state_dir`, creating the directory if needed.
    pub fn open(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir)
            .with_context(|| format!("Failed to create state directory: {}", state_dir.display()))?;
        Ok(Self {
            path: state_dir.join(HISTORY_FILE),
        })
    }

    /// Append the selection `selected` now active under `storage_key`.
    ///
    /// Returns the recorded change.
    pub fn record(&self, storage_key: &str, selected: &[String]) -> Result<RoleChange> {
        let change = RoleChange::now(storage_key, selected);
        let line = serde_json::to_string(&change).context("Failed to serialize role change")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history: {}", self.path.display()))?;
        writeln!(file, "{line}").context("Failed to append role change")?;

        tracing::debug!(storage_key, ?selected, "role change recorded");
        Ok(change)
    }

    /// Every recorded change, oldest first. A missing file is an empty history.
    pub fn changes(&self) -> Result<Vec<RoleChange>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to open history: {}", self.path.display()))
            }
        };

        let mut changes = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.context("Failed to read role history")?;
            if line.trim().is_empty() {
                continue;
            }
            changes.push(
                serde_json::from_str(&line)
                    .with_context(|| format!("Corrupt role change on line {}", index + 1))?,
            );
        }
        Ok(changes)
    }

    /// Changes recorded under `storage_key`, oldest first
    pub fn changes_for(&self, storage_key: &str) -> Result<Vec<RoleChange>> {
        let mut changes = self.changes()?;
        changes.retain(|c| c.storage_key == storage_key);
        Ok(changes)
    }

    /// Path of the history file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
