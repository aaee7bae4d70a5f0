//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `tokio::process` types in any signature
//! - Observer methods are fire-and-forget and must not block
//! - Version control is intent-based (stage, commit, push), not argv-based

pub mod observer;
pub mod version_control;

use std::path::PathBuf;

use thiserror::Error;

pub use observer::{NoopObserver, ServerObserver};
pub use version_control::{CommitResult, VersionControl};

/// Domain-specific errors for child process operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Process creation failed.
    #[error("Failed to start: {0}")]
    SpawnFailed(String),

    /// The executable does not exist.
    #[error("Executable not found: {}", .0.display())]
    ExecutableMissing(PathBuf),

    /// Writing to the child's input failed (typically a broken pipe).
    #[error("Failed to write to process input: {0}")]
    WriteFailed(String),

    /// The process is not running.
    #[error("Process not running")]
    NotRunning,
}

/// Errors from the external version-control tool.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The tool could not be launched at all.
    #[error("Failed to run `{command}`: {reason}")]
    Unavailable { command: String, reason: String },

    /// The tool exited non-zero.
    #[error("`{command}` exited with {}: {stderr}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool succeeded but printed something unparseable.
    #[error("Unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("code {c}"))
}

/// Core error type for semantic domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Process operation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Version control operation failed.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// A classification pattern failed to compile.
    #[error("Invalid output pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message() {
        let err = VcsError::CommandFailed {
            command: "git push origin main --force".into(),
            code: Some(128),
            stderr: "remote rejected".into(),
        };
        assert_eq!(
            err.to_string(),
            "`git push origin main --force` exited with code 128: remote rejected"
        );
    }

    #[test]
    fn test_core_error_wraps_process() {
        let err: CoreError = ProcessError::ExecutableMissing(PathBuf::from("/opt/playit")).into();
        assert_eq!(err.to_string(), "Executable not found: /opt/playit");
    }
}
