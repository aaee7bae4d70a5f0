//! Event vocabulary shared by every producer and the controller.
//!
//! Readers, backup workers and the supervisor all speak [`Event`]. Each event
//! is produced once and consumed exactly once by the controller, which is the
//! only place observable state changes.
//!
//! # Wire Format
//!
//! Events serialize with a `type` tag so they can be logged or forwarded:
//!
//! ```json
//! { "type": "player_joined", "name": "Bob" }
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::BackupOutcome;

/// Which producer a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamRole {
    /// Supervised game server output.
    Server,
    /// Tunnel exposure process output.
    Tunnel,
    /// Backup worker progress.
    Backup,
}

impl StreamRole {
    /// Prefix used when a line from this role is shown on the console.
    pub const fn console_prefix(self) -> Option<&'static str> {
        match self {
            Self::Server => None,
            Self::Tunnel => Some("[Tunnel]"),
            Self::Backup => Some("[Backup]"),
        }
    }
}

/// Failure categories reported through the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Process creation failed.
    SpawnFailure,
    /// Tunnel executable not found.
    ExecutableMissing,
    /// Writing to a child's input failed.
    WriteFailure,
    /// External tool exited non-zero.
    ToolInvocationFailure,
}

/// A typed, immutable fact queued for the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Verbatim output line, kept for display only.
    RawLine { role: StreamRole, text: String },

    /// The server printed its startup-complete line.
    StatusRunning,

    /// A child's output stream closed.
    StatusStopped {
        role: StreamRole,
        /// Spawn counter of the child that closed.
        lifetime: u64,
    },

    /// A player joined.
    PlayerJoined { name: String },

    /// A player left.
    PlayerLeft { name: String },

    /// The tunnel printed its public address.
    TunnelAddressDetected {
        address: String,
        /// Spawn counter of the tunnel that printed it; `0` until stamped
        /// by the child's [`OutputExtractor`](crate::OutputExtractor).
        lifetime: u64,
    },

    /// A backup cycle finished.
    BackupCompleted {
        timestamp: DateTime<Local>,
        outcome: BackupOutcome,
    },

    /// Something failed; reported, never fatal.
    Failure { kind: FailureKind, detail: String },
}

impl Event {
    /// Create a raw line event.
    pub fn raw(role: StreamRole, text: impl Into<String>) -> Self {
        Self::RawLine {
            role,
            text: text.into(),
        }
    }

    /// Create a player joined event.
    pub fn player_joined(name: impl Into<String>) -> Self {
        Self::PlayerJoined { name: name.into() }
    }

    /// Create a player left event.
    pub fn player_left(name: impl Into<String>) -> Self {
        Self::PlayerLeft { name: name.into() }
    }

    /// Create a tunnel address event for the tunnel child `lifetime`.
    pub fn tunnel_address(address: impl Into<String>, lifetime: u64) -> Self {
        Self::TunnelAddressDetected {
            address: address.into(),
            lifetime,
        }
    }

    /// Create a failure event.
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }
}
