//! Game server supervisor.
//!
//! Owns the server child, its input pipe and the lifecycle state. State only
//! advances on requests (start, stop) and on events the controller hands back
//! from the output reader; there are no wall-clock transitions apart from the
//! deferred start of a restart.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hearth_core::{
    Event, FailureKind, Lifecycle, OutputExtractor, ProcessError, RuleTable, ServerState,
    Settings,
};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::shutdown::{reap_in_background, terminate_child};
use super::stream::spawn_output_reader;
use crate::dispatch::EventSender;

/// SIGTERM grace used by [`ServerSupervisor::kill`] before SIGKILL.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// How to launch and stop the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLaunch {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Line written to the server's input for a graceful stop.
    pub stop_command: String,
    /// Delay between a restart's stop completing and the new start.
    pub restart_delay: Duration,
}

impl ServerLaunch {
    pub fn from_settings(settings: &Settings) -> Self {
        let (program, args) = settings.server_argv();
        Self {
            program,
            args,
            working_dir: settings.effective_server_dir(),
            stop_command: settings.effective_stop_command().to_string(),
            restart_delay: settings.restart_delay(),
        }
    }

    /// Command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A live server child.
struct ServerChild {
    child: Child,
    stdin: Option<ChildStdin>,
    reader: JoinHandle<()>,
}

/// Supervises the game server process.
pub struct ServerSupervisor {
    launch: ServerLaunch,
    rules: Arc<RuleTable>,
    events: EventSender,
    state: ServerState,
    child: Option<ServerChild>,
    /// Spawn counter; identifies which child a `StatusStopped` belongs to.
    lifetime: u64,
    restart_pending: bool,
    deferred_start: Option<Instant>,
}

impl ServerSupervisor {
    pub fn new(launch: ServerLaunch, rules: Arc<RuleTable>, events: EventSender) -> Self {
        Self {
            launch,
            rules,
            events,
            state: ServerState::Offline,
            child: None,
            lifetime: 0,
            restart_pending: false,
            deferred_start: None,
        }
    }

    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Whether a server child currently exists.
    pub const fn is_alive(&self) -> bool {
        self.child.is_some()
    }

    pub const fn lifetime(&self) -> u64 {
        self.lifetime
    }

    pub const fn restart_pending(&self) -> bool {
        self.restart_pending || self.deferred_start.is_some()
    }

    pub fn launch(&self) -> &ServerLaunch {
        &self.launch
    }

    /// Spawn the server. No-op if a child already exists.
    ///
    /// A spawn failure is also queued as a `Failure` event and leaves the
    /// state `Offline`.
    pub fn start(&mut self) -> Result<(), ProcessError> {
        if self.child.is_some() {
            debug!(state = %self.state, "Start ignored, server already has a process");
            return Ok(());
        }
        self.deferred_start = None;
        self.state = self.state.transition(Lifecycle::StartRequested);
        info!(
            command = %self.launch.display(),
            dir = %self.launch.working_dir.display(),
            "Starting server"
        );

        let mut child = match Command::new(&self.launch.program)
            .args(&self.launch.args)
            .current_dir(&self.launch.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let err = ProcessError::SpawnFailed(format!("{}: {e}", self.launch.program));
                warn!(error = %err, "Server spawn failed");
                self.state = self.state.transition(Lifecycle::SpawnFailed);
                self.events
                    .send(Event::failure(FailureKind::SpawnFailure, err.to_string()));
                return Err(err);
            }
        };

        self.lifetime += 1;
        let extractor = OutputExtractor::new(Arc::clone(&self.rules), self.lifetime);
        let reader = spawn_output_reader(
            child.stdout.take(),
            child.stderr.take(),
            extractor,
            self.events.clone(),
        );
        debug!(pid = ?child.id(), lifetime = self.lifetime, "Server process spawned");

        self.child = Some(ServerChild {
            stdin: child.stdin.take(),
            child,
            reader,
        });
        Ok(())
    }

    /// Ask the server to stop gracefully. No-op if there is no child.
    ///
    /// If the stop command cannot be written the child is killed instead.
    pub async fn stop(&mut self) {
        if self.child.is_none() {
            return;
        }
        self.state = self.state.transition(Lifecycle::StopRequested);
        let command = self.launch.stop_command.clone();
        info!(%command, "Stopping server");

        if let Err(e) = self.write_line(&command).await {
            warn!(error = %e, "Graceful stop failed, terminating server");
            self.events
                .send(Event::failure(FailureKind::WriteFailure, e.to_string()));
            if let Some(server) = self.child.as_mut() {
                if let Err(e) = server.child.start_kill() {
                    debug!(error = %e, "start_kill failed");
                }
            }
        }
    }

    /// Stop and start again. With no child this is a plain start.
    pub async fn restart(&mut self) -> Result<(), ProcessError> {
        if self.child.is_none() {
            return self.start();
        }
        self.restart_pending = true;
        self.stop().await;
        Ok(())
    }

    /// Write a console command. Blank input and a missing child are no-ops.
    ///
    /// Returns whether the command was delivered. A broken pipe is logged
    /// and queued as a failure, never raised.
    pub async fn send_command(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.child.is_none() {
            return false;
        }
        match self.write_line(text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, command = %text, "Dropped server command");
                self.events
                    .send(Event::failure(FailureKind::WriteFailure, e.to_string()));
                false
            }
        }
    }

    /// The server printed its startup-complete line.
    pub fn mark_ready(&mut self) {
        if self.child.is_some() {
            self.state = self.state.transition(Lifecycle::ServerReady);
        }
    }

    /// A server reader finished. Returns `false` for a stale lifetime.
    pub fn on_output_closed(&mut self, lifetime: u64) -> bool {
        if lifetime != self.lifetime || self.child.is_none() {
            debug!(lifetime, current = self.lifetime, "Ignoring stale server stop");
            return false;
        }
        if let Some(server) = self.child.take() {
            reap_in_background(server.child);
        }
        self.state = self.state.transition(Lifecycle::OutputClosed);
        info!(lifetime, "Server process exited");

        if std::mem::take(&mut self.restart_pending) {
            self.deferred_start = Some(Instant::now() + self.launch.restart_delay);
        }
        true
    }

    /// Run a deferred restart once its deadline has passed.
    ///
    /// Returns `true` if a start was attempted.
    pub fn poll_deferred_start(&mut self, now: Instant) -> bool {
        match self.deferred_start {
            Some(at) if now >= at => {
                self.deferred_start = None;
                if let Err(e) = self.start() {
                    debug!(error = %e, "Deferred restart failed");
                }
                true
            }
            _ => false,
        }
    }

    /// Force the server down (SIGTERM, then SIGKILL) and wait for it.
    pub async fn kill(&mut self) {
        let Some(mut server) = self.child.take() else {
            return;
        };
        warn!("Terminating server process");
        drop(server.stdin.take());
        match terminate_child(&mut server.child, TERM_GRACE).await {
            Ok(status) => info!(%status, "Server terminated"),
            Err(e) => warn!(error = %e, "Failed to terminate server"),
        }
        // The reader ends on its own once the pipes close; its stop event
        // will carry a lifetime with no child and be ignored.
        drop(server.reader);
        self.restart_pending = false;
        self.deferred_start = None;
        self.state = self.state.transition(Lifecycle::OutputClosed);
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ProcessError> {
        let stdin = self
            .child
            .as_mut()
            .and_then(|server| server.stdin.as_mut())
            .ok_or(ProcessError::NotRunning)?;

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        stdin
            .write_all(&bytes)
            .await
            .map_err(|e| ProcessError::WriteFailed(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| ProcessError::WriteFailed(e.to_string()))
    }
}
