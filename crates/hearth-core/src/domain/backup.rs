//! Backup cycle outcomes and the controller's record of them.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// `strftime` format used in backup commit messages.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Step of a backup cycle, used to say where a cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStep {
    Stage,
    Commit,
    CountCommits,
    Squash,
    Push,
}

impl fmt::Display for BackupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::CountCommits => "count commits",
            Self::Squash => "squash",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// Result of one backup cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BackupOutcome {
    /// The snapshot reached the remote.
    Pushed {
        /// Branch name that accepted the push.
        branch: String,
        /// Commit count before squashing, when a squash happened.
        squashed_from: Option<u32>,
    },
    /// Nothing changed since the last snapshot; no push attempted.
    NoChanges,
    /// A step failed; the cycle was abandoned.
    Failed { step: BackupStep, detail: String },
}

impl BackupOutcome {
    /// Whether the cycle ended without error.
    pub const fn success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Whether this outcome advances the last-successful-backup timestamp.
    pub const fn reached_remote(&self) -> bool {
        matches!(self, Self::Pushed { .. })
    }

    /// One-line description for display.
    pub fn detail(&self) -> String {
        match self {
            Self::Pushed {
                branch,
                squashed_from: Some(count),
            } => format!("Backup pushed to origin/{branch} (squashed {count} -> 2 commits)"),
            Self::Pushed { branch, .. } => format!("Backup pushed to origin/{branch}"),
            Self::NoChanges => "No changes to backup".to_string(),
            Self::Failed { step, detail } => format!("Backup failed during {step}: {detail}"),
        }
    }
}

/// Last completed cycle as seen by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// When the last cycle (of any outcome) completed.
    pub last_completed: Option<DateTime<Local>>,
    /// Outcome of the last cycle.
    pub last_outcome: Option<BackupOutcome>,
    /// When a snapshot last reached the remote.
    pub last_success: Option<DateTime<Local>>,
}

impl BackupRecord {
    /// Fold a completed cycle into the record.
    pub fn record(&mut self, timestamp: DateTime<Local>, outcome: &BackupOutcome) {
        self.last_completed = Some(timestamp);
        if outcome.reached_remote() {
            self.last_success = Some(timestamp);
        }
        self.last_outcome = Some(outcome.clone());
    }

    /// Label for the "last backup" display.
    pub fn last_success_label(&self) -> String {
        self.last_success.map_or_else(
            || "Never".to_string(),
            |ts| ts.format(BACKUP_TIMESTAMP_FORMAT).to_string(),
        )
    }
}
