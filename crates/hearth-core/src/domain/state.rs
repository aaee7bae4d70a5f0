//! Server lifecycle state machine.
//!
//! The state only moves through [`ServerState::transition`]. Requests
//! (start/stop) move it into the transient states; the terminal moves into
//! `Running` and `Offline` are driven exclusively by what the server's own
//! output says, never by a wall-clock timer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of the supervised server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    /// No server child exists.
    #[default]
    Offline,
    /// Child spawned, startup marker not seen yet.
    Starting,
    /// Startup marker seen; accepting players.
    Running,
    /// Shutdown requested, waiting for the output stream to close.
    Stopping,
}

/// Inputs accepted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// A start request spawned (or is about to spawn) a child.
    StartRequested,
    /// Spawning the child failed.
    SpawnFailed,
    /// A stop request was delivered to the child.
    StopRequested,
    /// The extractor saw the startup-complete line.
    ServerReady,
    /// The child's output stream closed.
    OutputClosed,
}

impl ServerState {
    /// Apply a lifecycle input, returning the next state.
    ///
    /// Inputs that make no sense in the current state leave it unchanged.
    #[must_use]
    pub const fn transition(self, input: Lifecycle) -> Self {
        match (self, input) {
            (Self::Offline, Lifecycle::StartRequested) => Self::Starting,
            (Self::Starting, Lifecycle::SpawnFailed) => Self::Offline,
            (Self::Starting, Lifecycle::ServerReady) => Self::Running,
            (Self::Starting | Self::Running, Lifecycle::StopRequested) => Self::Stopping,
            (Self::Starting | Self::Running | Self::Stopping, Lifecycle::OutputClosed) => {
                Self::Offline
            }
            (state, _) => state,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "Offline",
            Self::Starting => "Starting",
            Self::Running => "Online",
            Self::Stopping => "Stopping",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
