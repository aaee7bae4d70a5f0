//! Version-control port used by backup cycles.
//!
//! One method per tool invocation. The backup cycle decides ordering and
//! policy; implementations only run the step and report what happened.

use async_trait::async_trait;

use super::VcsError;

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    /// A new commit was created.
    Committed,
    /// The tool reported nothing to commit.
    NothingToCommit,
}

/// Snapshot/rotate/push operations against the backed-up working tree.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Stage every working-tree change (`add -A`).
    async fn stage_all(&self) -> Result<(), VcsError>;

    /// Commit staged changes with `message`.
    async fn commit(&self, message: &str) -> Result<CommitResult, VcsError>;

    /// Total commits reachable from `HEAD`.
    async fn commit_count(&self) -> Result<u32, VcsError>;

    /// Move `HEAD` back `commits` commits, keeping the tree staged.
    async fn reset_soft(&self, commits: u32) -> Result<(), VcsError>;

    /// Force-push `branch` to `remote`.
    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), VcsError>;
}
