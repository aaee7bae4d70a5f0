//! Tunnel process manager.
//!
//! Mirrors the server supervisor for the exposure agent but carries no
//! policy: when to run the tunnel is decided by the controller.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use hearth_core::{Event, FailureKind, OutputExtractor, ProcessError, RuleTable, Settings};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::shutdown::kill_and_reap;
use super::stream::spawn_output_reader;
use crate::dispatch::EventSender;

/// Where the tunnel agent lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelLaunch {
    pub executable: PathBuf,
    pub working_dir: PathBuf,
}

impl TunnelLaunch {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            executable: settings.effective_tunnel_executable(),
            working_dir: settings.effective_server_dir(),
        }
    }
}

/// Manages the tunnel exposure process.
pub struct TunnelManager {
    launch: TunnelLaunch,
    rules: Arc<RuleTable>,
    events: EventSender,
    child: Option<Child>,
    lifetime: u64,
    address: Option<String>,
}

impl TunnelManager {
    pub fn new(launch: TunnelLaunch, rules: Arc<RuleTable>, events: EventSender) -> Self {
        Self {
            launch,
            rules,
            events,
            child: None,
            lifetime: 0,
            address: None,
        }
    }

    pub const fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Last detected public address.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Spawn the tunnel agent with no arguments. No-op if already running.
    ///
    /// A missing executable fails distinctly from a spawn failure; both are
    /// queued as `Failure` events as well as returned.
    pub fn start(&mut self) -> Result<(), ProcessError> {
        if self.child.is_some() {
            return Ok(());
        }

        let executable = &self.launch.executable;
        if !executable.is_file() {
            let err = ProcessError::ExecutableMissing(executable.clone());
            warn!(error = %err, "Tunnel not started");
            self.events
                .send(Event::failure(FailureKind::ExecutableMissing, err.to_string()));
            return Err(err);
        }

        let mut child = Command::new(executable)
            .current_dir(&self.launch.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let err = ProcessError::SpawnFailed(format!("{}: {e}", executable.display()));
                warn!(error = %err, "Tunnel spawn failed");
                self.events
                    .send(Event::failure(FailureKind::SpawnFailure, err.to_string()));
                err
            })?;

        self.lifetime += 1;
        let extractor = OutputExtractor::new(Arc::clone(&self.rules), self.lifetime);
        // The reader ends with the child's pipes; it needs no handle.
        drop(spawn_output_reader(
            child.stdout.take(),
            child.stderr.take(),
            extractor,
            self.events.clone(),
        ));
        info!(pid = ?child.id(), lifetime = self.lifetime, "Tunnel started");

        self.child = Some(child);
        Ok(())
    }

    /// Terminate the tunnel immediately. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        let Some(child) = self.child.take() else {
            return false;
        };
        info!(pid = ?child.id(), "Stopping tunnel");
        kill_and_reap(child);
        self.address = None;
        true
    }

    /// Record an address printed by tunnel child `lifetime`. Returns whether
    /// it changed. Addresses from an earlier child are ignored.
    pub fn set_address(&mut self, address: &str, lifetime: u64) -> bool {
        if self.child.is_none() || lifetime != self.lifetime {
            debug!(
                %address,
                lifetime,
                current = self.lifetime,
                "Ignoring stale tunnel address"
            );
            return false;
        }
        if self.address.as_deref() == Some(address) {
            return false;
        }
        self.address = Some(address.to_string());
        true
    }

    /// A tunnel reader finished. Returns `false` for a stale lifetime.
    pub fn on_output_closed(&mut self, lifetime: u64) -> bool {
        if lifetime != self.lifetime || self.child.is_none() {
            return false;
        }
        if let Some(child) = self.child.take() {
            kill_and_reap(child);
        }
        self.address = None;
        info!(lifetime, "Tunnel process exited");
        true
    }
}
