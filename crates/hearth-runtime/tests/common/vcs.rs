//! In-memory `VersionControl` fakes.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use hearth_core::{CommitResult, VcsError, VersionControl};

/// One recorded port call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Stage,
    Commit(String),
    Count,
    Reset(u32),
    Push(String, String),
}

fn failed(command: &str) -> VcsError {
    VcsError::CommandFailed {
        command: command.to_string(),
        code: Some(1),
        stderr: "scripted failure".to_string(),
    }
}

/// Answers from a script and records every call.
///
/// `commit` always succeeds unless `nothing_to_commit` is set, in which
/// case the *first* commit of a cycle reports nothing to commit.
#[derive(Debug, Default)]
pub struct ScriptedVcs {
    pub calls: Mutex<Vec<Call>>,
    pub counts: Mutex<VecDeque<u32>>,
    pub failing_branches: Vec<String>,
    pub nothing_to_commit: bool,
    pub fail_stage: bool,
}

impl ScriptedVcs {
    pub fn with_counts(counts: impl IntoIterator<Item = u32>) -> Self {
        Self {
            counts: Mutex::new(counts.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing_branches(mut self, branches: &[&str]) -> Self {
        self.failing_branches = branches.iter().map(ToString::to_string).collect();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VersionControl for ScriptedVcs {
    async fn stage_all(&self) -> Result<(), VcsError> {
        self.record(Call::Stage);
        if self.fail_stage {
            return Err(failed("git add -A"));
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<CommitResult, VcsError> {
        self.record(Call::Commit(message.to_string()));
        if self.nothing_to_commit {
            Ok(CommitResult::NothingToCommit)
        } else {
            Ok(CommitResult::Committed)
        }
    }

    async fn commit_count(&self) -> Result<u32, VcsError> {
        self.record(Call::Count);
        self.counts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| failed("git rev-list --count HEAD"))
    }

    async fn reset_soft(&self, commits: u32) -> Result<(), VcsError> {
        self.record(Call::Reset(commits));
        Ok(())
    }

    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.record(Call::Push(remote.to_string(), branch.to_string()));
        if self.failing_branches.iter().any(|b| b == branch) {
            return Err(failed(&format!("git push {remote} {branch} --force")));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RepoState {
    commits: Vec<String>,
    dirty: bool,
    staged: bool,
}

/// A tiny model of a git repository: commit history, a working tree that
/// is either clean or dirty, and an index that is either empty or not.
#[derive(Debug, Default)]
pub struct SimulatedRepo {
    state: Mutex<RepoState>,
}

impl SimulatedRepo {
    /// Pretend the server wrote to its world files.
    pub fn touch(&self) {
        self.state.lock().unwrap().dirty = true;
    }

    pub fn history(&self) -> Vec<String> {
        self.state.lock().unwrap().commits.clone()
    }
}

#[async_trait]
impl VersionControl for SimulatedRepo {
    async fn stage_all(&self) -> Result<(), VcsError> {
        let mut state = self.state.lock().unwrap();
        if state.dirty {
            state.dirty = false;
            state.staged = true;
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<CommitResult, VcsError> {
        let mut state = self.state.lock().unwrap();
        if !state.staged {
            return Ok(CommitResult::NothingToCommit);
        }
        state.staged = false;
        state.commits.push(message.to_string());
        Ok(CommitResult::Committed)
    }

    async fn commit_count(&self) -> Result<u32, VcsError> {
        let state = self.state.lock().unwrap();
        Ok(u32::try_from(state.commits.len()).unwrap())
    }

    async fn reset_soft(&self, commits: u32) -> Result<(), VcsError> {
        let mut state = self.state.lock().unwrap();
        let n = commits as usize;
        if n >= state.commits.len() {
            return Err(failed(&format!("git reset --soft HEAD~{commits}")));
        }
        let keep = state.commits.len() - n;
        state.commits.truncate(keep);
        state.staged = true;
        Ok(())
    }

    async fn force_push(&self, _remote: &str, _branch: &str) -> Result<(), VcsError> {
        Ok(())
    }
}
