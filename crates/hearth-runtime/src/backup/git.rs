//! `git` binary adapter for the [`VersionControl`] port.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use hearth_core::{CommitResult, VcsError, VersionControl};
use tokio::process::Command;
use tracing::debug;

/// Marker git prints when a commit has nothing staged.
const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// Runs one `git` invocation per step inside the backed-up directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(program: impl Into<String>, repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    /// Run git and return its output, whatever the exit status.
    async fn output(&self, args: &[&str]) -> Result<Output, VcsError> {
        debug!(command = %self.describe(args), "Running git");
        Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VcsError::Unavailable {
                command: self.describe(args),
                reason: e.to_string(),
            })
    }

    /// Run git and require a zero exit status.
    async fn run(&self, args: &[&str]) -> Result<Output, VcsError> {
        let output = self.output(args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(self.failure(args, &output))
        }
    }

    fn failure(&self, args: &[&str], output: &Output) -> VcsError {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        VcsError::CommandFailed {
            command: self.describe(args),
            code: output.status.code(),
            stderr,
        }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn stage_all(&self) -> Result<(), VcsError> {
        self.run(&["add", "-A"]).await.map(drop)
    }

    async fn commit(&self, message: &str) -> Result<CommitResult, VcsError> {
        let args = ["commit", "-m", message];
        let output = self.output(&args).await?;

        // git exits 1 for an empty commit; the message is the signal.
        let said_nothing = [&output.stdout, &output.stderr]
            .iter()
            .any(|stream| String::from_utf8_lossy(stream).contains(NOTHING_TO_COMMIT));
        if said_nothing {
            return Ok(CommitResult::NothingToCommit);
        }
        if output.status.success() {
            Ok(CommitResult::Committed)
        } else {
            Err(self.failure(&args, &output))
        }
    }

    async fn commit_count(&self) -> Result<u32, VcsError> {
        let args = ["rev-list", "--count", "HEAD"];
        let output = self.run(&args).await?;
        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse()
            .map_err(|_| VcsError::UnexpectedOutput {
                command: self.describe(&args),
                output: text.trim().to_string(),
            })
    }

    async fn reset_soft(&self, commits: u32) -> Result<(), VcsError> {
        let target = format!("HEAD~{commits}");
        self.run(&["reset", "--soft", &target]).await.map(drop)
    }

    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.run(&["push", remote, branch, "--force"])
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn init_repo(dir: &Path) {
        for args in [
            &["init", "-q"][..],
            &["config", "user.email", "backup@example.com"],
            &["config", "user.name", "Backup"],
            &["config", "commit.gpgsign", "false"],
        ] {
            let status = std::process::Command::new("git")
                .args(args)
                .current_dir(dir)
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    #[tokio::test]
    async fn test_commit_cycle_against_real_git() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let git = GitCli::new("git", dir.path());

        std::fs::write(dir.path().join("level.dat"), b"one").unwrap();
        git.stage_all().await.unwrap();
        assert_eq!(git.commit("Backup: 1").await.unwrap(), CommitResult::Committed);

        git.stage_all().await.unwrap();
        assert_eq!(
            git.commit("Backup: 2").await.unwrap(),
            CommitResult::NothingToCommit
        );

        for i in 2..=4 {
            std::fs::write(dir.path().join("level.dat"), format!("v{i}")).unwrap();
            git.stage_all().await.unwrap();
            git.commit(&format!("Backup: {i}")).await.unwrap();
        }
        assert_eq!(git.commit_count().await.unwrap(), 4);

        git.reset_soft(3).await.unwrap();
        assert_eq!(git.commit_count().await.unwrap(), 1);
        assert_eq!(git.commit("Previous backup").await.unwrap(), CommitResult::Committed);
        assert_eq!(git.commit_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_push_without_remote_fails() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let git = GitCli::new("git", dir.path());

        let err = git.force_push("origin", "main").await.unwrap_err();
        assert!(matches!(err, VcsError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new("/nonexistent/hearth-git", dir.path());
        let err = git.stage_all().await.unwrap_err();
        assert!(matches!(err, VcsError::Unavailable { .. }));
    }
}
