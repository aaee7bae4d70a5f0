//! One snapshot/rotate/push cycle.

use chrono::{DateTime, Local};
use hearth_core::{
    BACKUP_TIMESTAMP_FORMAT, BackupOutcome, BackupStep, CommitResult, Event, StreamRole,
    VcsError, VersionControl,
};
use tracing::{info, warn};

use crate::dispatch::EventSender;

/// Commits kept after rotation: the squashed history plus the latest snapshot.
pub const RETAINED_COMMITS: u32 = 2;

/// Message of the commit holding the squashed history.
pub const SQUASHED_COMMIT_MESSAGE: &str = "Previous backup";

/// Where snapshots are pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    pub remote: String,
    /// Tried in order until one push succeeds.
    pub branches: Vec<String>,
}

impl Default for BackupPlan {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branches: vec!["main".to_string(), "master".to_string()],
        }
    }
}

/// Commit message for a snapshot taken at `now`.
pub fn snapshot_message(now: DateTime<Local>) -> String {
    format!("Backup: {}", now.format(BACKUP_TIMESTAMP_FORMAT))
}

type StepResult<T> = Result<T, (BackupStep, VcsError)>;

/// Run one cycle against `vcs`.
///
/// Progress lines are queued as `[Backup]` raw lines. Any failing step
/// ends the cycle with [`BackupOutcome::Failed`]; nothing is retried.
pub async fn run_backup_cycle(
    vcs: &dyn VersionControl,
    plan: &BackupPlan,
    now: DateTime<Local>,
    events: &EventSender,
) -> BackupOutcome {
    match run_steps(vcs, plan, now, events).await {
        Ok(outcome) => outcome,
        Err((step, err)) => {
            warn!(%step, error = %err, "Backup cycle failed");
            BackupOutcome::Failed {
                step,
                detail: err.to_string(),
            }
        }
    }
}

async fn run_steps(
    vcs: &dyn VersionControl,
    plan: &BackupPlan,
    now: DateTime<Local>,
    events: &EventSender,
) -> StepResult<BackupOutcome> {
    let message = snapshot_message(now);

    vcs.stage_all().await.map_err(|e| (BackupStep::Stage, e))?;
    let committed = vcs
        .commit(&message)
        .await
        .map_err(|e| (BackupStep::Commit, e))?;
    if committed == CommitResult::NothingToCommit {
        info!("Backup skipped, working tree unchanged");
        return Ok(BackupOutcome::NoChanges);
    }

    let count = vcs
        .commit_count()
        .await
        .map_err(|e| (BackupStep::CountCommits, e))?;

    let squashed_from = if count > RETAINED_COMMITS {
        progress(
            events,
            format!("Cleaning old backups ({count} -> {RETAINED_COMMITS})"),
        );
        squash(vcs, count, &message)
            .await
            .map_err(|e| (BackupStep::Squash, e))?;
        Some(count)
    } else {
        None
    };

    let branch = push(vcs, plan).await.map_err(|e| (BackupStep::Push, e))?;
    info!(%branch, ?squashed_from, "Backup pushed");
    Ok(BackupOutcome::Pushed {
        branch,
        squashed_from,
    })
}

/// Collapse everything but the root commit into one commit, then snapshot
/// anything left over. The final commit normally finds nothing to commit.
async fn squash(vcs: &dyn VersionControl, count: u32, message: &str) -> Result<(), VcsError> {
    vcs.reset_soft(count - 1).await?;
    vcs.commit(SQUASHED_COMMIT_MESSAGE).await?;
    vcs.stage_all().await?;
    vcs.commit(message).await?;
    Ok(())
}

/// Force-push, falling back through the plan's branch names.
async fn push(vcs: &dyn VersionControl, plan: &BackupPlan) -> Result<String, VcsError> {
    let mut last_err = None;
    for branch in &plan.branches {
        match vcs.force_push(&plan.remote, branch).await {
            Ok(()) => return Ok(branch.clone()),
            Err(e) => {
                warn!(%branch, error = %e, "Push failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| VcsError::Unavailable {
        command: "push".to_string(),
        reason: "no branches configured".to_string(),
    }))
}

fn progress(events: &EventSender, text: String) {
    events.send(Event::raw(StreamRole::Backup, text));
}
