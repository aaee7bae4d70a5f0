//! The controller loop.
//!
//! The controller is the only mutator of observable state. Readers and
//! backup workers talk to it through the dispatch queue; the presentation
//! layer talks to it through a [`ControllerHandle`] and listens through a
//! [`ServerObserver`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use hearth_core::{
    ActivityEntry, ActivityKind, ActivityLog, BackupOutcome, BackupRecord, CoreError, Event,
    PlayerSet, RuleTable, ServerObserver, ServerState, Settings, StreamRole, VersionControl,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::backup::{BackupPlan, BackupScheduler, BackupTrigger, GitCli};
use crate::console::{ConsoleBuffer, display_text};
use crate::dispatch::{EventReceiver, EventSender, event_queue};
use crate::process::{ServerLaunch, ServerSupervisor, TunnelLaunch, TunnelManager};

/// Requests from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    Start,
    Stop,
    Restart,
    SendCommand(String),
    RunBackupNow,
    ToggleTunnel,
    /// Stop everything and end the loop.
    Shutdown,
}

/// The controller loop has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Controller is no longer running")]
pub struct ControllerClosed;

/// Cloneable entry point for the presentation layer.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControlRequest>,
}

impl ControllerHandle {
    pub fn request(&self, request: ControlRequest) -> Result<(), ControllerClosed> {
        self.tx.send(request).map_err(|_| ControllerClosed)
    }

    pub fn start(&self) -> Result<(), ControllerClosed> {
        self.request(ControlRequest::Start)
    }

    pub fn stop(&self) -> Result<(), ControllerClosed> {
        self.request(ControlRequest::Stop)
    }

    pub fn restart(&self) -> Result<(), ControllerClosed> {
        self.request(ControlRequest::Restart)
    }

    pub fn send_command(&self, text: impl Into<String>) -> Result<(), ControllerClosed> {
        self.request(ControlRequest::SendCommand(text.into()))
    }

    pub fn run_backup_now(&self) -> Result<(), ControllerClosed> {
        self.request(ControlRequest::RunBackupNow)
    }

    pub fn toggle_tunnel(&self) -> Result<(), ControllerClosed> {
        self.request(ControlRequest::ToggleTunnel)
    }

    pub fn shutdown(&self) -> Result<(), ControllerClosed> {
        self.request(ControlRequest::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Timing and display limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub tick_interval: Duration,
    pub backup_interval: Duration,
    pub shutdown_grace: Duration,
    pub max_console_lines: usize,
    pub max_players: u32,
    pub tunnel_domain: String,
}

impl ControllerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tick_interval: settings.tick_interval(),
            backup_interval: settings.backup_interval(),
            shutdown_grace: settings.shutdown_grace(),
            max_console_lines: settings.effective_max_console_lines(),
            max_players: settings.effective_max_players(),
            tunnel_domain: settings.effective_tunnel_domain().to_string(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Owns the supervisor, tunnel manager and backup scheduler, and drains
/// the dispatch queue on every tick.
pub struct Controller {
    config: ControllerConfig,
    server: ServerSupervisor,
    tunnel: TunnelManager,
    backups: BackupScheduler,
    events_tx: EventSender,
    events: EventReceiver,
    requests: mpsc::UnboundedReceiver<ControlRequest>,
    observer: Arc<dyn ServerObserver>,
    console: ConsoleBuffer,
    players: PlayerSet,
    activity: ActivityLog,
    backup_record: BackupRecord,
    reported_state: ServerState,
    shutting_down: bool,
}

impl Controller {
    /// Build a controller with the `git` adapter from settings.
    pub fn from_settings(
        settings: &Settings,
        observer: Arc<dyn ServerObserver>,
    ) -> Result<(Self, ControllerHandle), CoreError> {
        let vcs = Arc::new(GitCli::new(
            settings.effective_git_path(),
            settings.effective_server_dir(),
        ));
        Self::new(
            ControllerConfig::from_settings(settings),
            ServerLaunch::from_settings(settings),
            TunnelLaunch::from_settings(settings),
            vcs,
            observer,
        )
    }

    pub fn new(
        config: ControllerConfig,
        server: ServerLaunch,
        tunnel: TunnelLaunch,
        vcs: Arc<dyn VersionControl>,
        observer: Arc<dyn ServerObserver>,
    ) -> Result<(Self, ControllerHandle), CoreError> {
        let (events_tx, events) = event_queue();
        let (requests_tx, requests) = mpsc::unbounded_channel();

        let server = ServerSupervisor::new(
            server,
            Arc::new(RuleTable::server()?),
            events_tx.clone(),
        );
        let tunnel = TunnelManager::new(
            tunnel,
            Arc::new(RuleTable::tunnel(&config.tunnel_domain)?),
            events_tx.clone(),
        );
        let backups = BackupScheduler::new(vcs, BackupPlan::default(), events_tx.clone());

        let controller = Self {
            console: ConsoleBuffer::new(config.max_console_lines),
            config,
            server,
            tunnel,
            backups,
            events_tx,
            events,
            requests,
            observer,
            players: PlayerSet::new(),
            activity: ActivityLog::default(),
            backup_record: BackupRecord::default(),
            reported_state: ServerState::Offline,
            shutting_down: false,
        };
        Ok((controller, ControllerHandle { tx: requests_tx }))
    }

    /// A sender for the controller's queue, for additional producers.
    pub fn event_sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub const fn state(&self) -> ServerState {
        self.server.state()
    }

    pub fn players(&self) -> &[String] {
        self.players.names()
    }

    /// `"<online>/<max> online"`.
    pub fn player_summary(&self) -> String {
        format!("{}/{} online", self.players.len(), self.config.max_players)
    }

    pub fn tunnel_address(&self) -> Option<&str> {
        self.tunnel.address()
    }

    pub const fn is_tunnel_running(&self) -> bool {
        self.tunnel.is_running()
    }

    pub const fn console(&self) -> &ConsoleBuffer {
        &self.console
    }

    pub const fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub const fn backup_record(&self) -> &BackupRecord {
        &self.backup_record
    }

    pub fn is_backup_running(&self) -> bool {
        self.backups.is_running()
    }

    /// Run until shutdown is requested or every handle is dropped.
    pub async fn run(mut self) {
        let mut tick = time::interval(self.config.tick_interval.max(Duration::from_millis(1)));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let backup_period = self.config.backup_interval.max(Duration::from_secs(1));
        let mut backup = time::interval_at(time::Instant::now() + backup_period, backup_period);
        backup.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            tick = ?self.config.tick_interval,
            backup = ?self.config.backup_interval,
            "Controller running"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => self.tick(),
                _ = backup.tick() => self.on_backup_interval(),
                request = self.requests.recv() => match request {
                    Some(ControlRequest::Shutdown) | None => break,
                    Some(request) => self.handle_request(request).await,
                },
            }
        }

        self.shutdown().await;
        info!("Controller stopped");
    }

    /// Apply one presentation-layer request.
    pub async fn handle_request(&mut self, request: ControlRequest) {
        debug!(?request, "Control request");
        match request {
            ControlRequest::Start => self.start_server(),
            ControlRequest::Stop => self.stop_server().await,
            ControlRequest::Restart => self.restart_server().await,
            ControlRequest::SendCommand(text) => self.send_command(&text).await,
            ControlRequest::RunBackupNow => self.run_backup_now(),
            ControlRequest::ToggleTunnel => self.toggle_tunnel(),
            ControlRequest::Shutdown => self.shutdown().await,
        }
    }

    /// Drain the queue and apply every event, then run any due restart.
    /// An empty queue makes this a no-op.
    pub fn tick(&mut self) {
        for event in self.events.drain() {
            self.apply(event);
        }
        if !self.shutting_down && self.server.poll_deferred_start(Instant::now()) {
            self.sync_state();
        }
    }

    pub fn start_server(&mut self) {
        if self.shutting_down {
            return;
        }
        if let Err(e) = self.server.start() {
            debug!(error = %e, "Start failed");
        }
        self.sync_state();
    }

    /// Graceful stop. No-op without a live server.
    pub async fn stop_server(&mut self) {
        if !self.server.is_alive() {
            return;
        }
        self.server.stop().await;
        self.sync_state();
    }

    pub async fn restart_server(&mut self) {
        if self.shutting_down {
            return;
        }
        if self.server.is_alive() {
            self.append_manager("Restarting server...");
        }
        if let Err(e) = self.server.restart().await {
            debug!(error = %e, "Restart failed");
        }
        self.sync_state();
    }

    /// Send a console command to the server, echoing it as `> text`.
    pub async fn send_command(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.server.is_alive() {
            self.append_manager("Server is not running");
            return;
        }
        if self.server.send_command(text).await {
            self.append_line(format!("> {text}"));
        }
    }

    /// Start a backup regardless of server state.
    pub fn run_backup_now(&mut self) {
        if !self.backups.trigger(BackupTrigger::Manual) {
            self.append_line(display_text(
                StreamRole::Backup,
                "A backup is already in progress",
            ));
        }
    }

    pub fn toggle_tunnel(&mut self) {
        if self.tunnel.is_running() {
            self.stop_tunnel();
        } else {
            self.start_tunnel();
        }
    }

    /// Stop the tunnel, then the server within the grace period, then force.
    ///
    /// An in-flight backup is left to finish on its own.
    pub async fn shutdown(&mut self) {
        if self.shutting_down {
            return;
        }
        self.shutting_down = true;
        info!("Shutting down");

        self.stop_tunnel();

        if self.server.is_alive() {
            if self.server.state() != ServerState::Stopping {
                self.server.stop().await;
                self.sync_state();
            }

            let deadline = Instant::now() + self.config.shutdown_grace;
            while self.server.is_alive() && Instant::now() < deadline {
                time::sleep(self.config.tick_interval).await;
                self.tick();
            }

            if self.server.is_alive() {
                warn!(grace = ?self.config.shutdown_grace, "Server did not stop in time");
                self.append_manager("Server did not stop in time, terminating");
                self.server.kill().await;
                self.sync_state();
            }
        }

        self.tick();
    }

    /// The backup interval elapsed. Only an online server is backed up on
    /// schedule.
    pub fn on_backup_interval(&mut self) {
        if self.server.state() == ServerState::Running {
            self.backups.trigger(BackupTrigger::Interval);
        } else {
            debug!(state = %self.server.state(), "Scheduled backup skipped, server not running");
        }
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::RawLine { role, text } => self.append_line(display_text(role, &text)),
            Event::StatusRunning => {
                self.server.mark_ready();
                self.sync_state();
            }
            Event::StatusStopped {
                role: StreamRole::Server,
                lifetime,
            } => {
                if self.server.on_output_closed(lifetime) {
                    self.sync_state();
                }
            }
            Event::StatusStopped {
                role: StreamRole::Tunnel,
                lifetime,
            } => {
                let had_address = self.tunnel.address().is_some();
                if self.tunnel.on_output_closed(lifetime) {
                    self.append_line(display_text(StreamRole::Tunnel, "Tunnel process exited"));
                    self.push_activity(ActivityKind::Warn, "Tunnel stopped");
                    if had_address {
                        self.observer.on_tunnel_address_changed("");
                    }
                }
            }
            Event::StatusStopped {
                role: StreamRole::Backup,
                ..
            } => {}
            Event::PlayerJoined { name } => {
                if self.players.join(&name) {
                    self.observer.on_player_list_changed(self.players.names());
                    self.push_activity(ActivityKind::Join, format!("{name} joined"));
                }
            }
            Event::PlayerLeft { name } => {
                if self.players.leave(&name) {
                    self.observer.on_player_list_changed(self.players.names());
                    self.push_activity(ActivityKind::Leave, format!("{name} left"));
                }
            }
            Event::TunnelAddressDetected { address, lifetime } => {
                if self.tunnel.set_address(&address, lifetime) {
                    info!(%address, "Tunnel address detected");
                    self.observer.on_tunnel_address_changed(&address);
                    self.push_activity(ActivityKind::Info, format!("Tunnel address: {address}"));
                }
            }
            Event::BackupCompleted { timestamp, outcome } => {
                self.record_backup(timestamp, &outcome);
            }
            Event::Failure { kind, detail } => {
                warn!(?kind, %detail, "Reported failure");
                self.append_manager(&format!("Error: {detail}"));
                self.push_activity(ActivityKind::Warn, detail);
            }
        }
    }

    /// Report a state change once, with its side effects.
    fn sync_state(&mut self) {
        let state = self.server.state();
        if state == self.reported_state {
            return;
        }
        let previous = std::mem::replace(&mut self.reported_state, state);
        info!(from = %previous, to = %state, "Server state changed");
        self.observer.on_status_changed(state);

        match state {
            ServerState::Starting => self.append_manager("Starting server..."),
            ServerState::Running => {
                self.append_manager("Server is ONLINE!");
                self.push_activity(ActivityKind::Info, "Server online");
                self.start_tunnel();
            }
            ServerState::Stopping => self.append_manager("Stopping server..."),
            ServerState::Offline => {
                self.append_manager("Server stopped");
                self.push_activity(ActivityKind::Info, "Server stopped");
                if self.players.clear() {
                    self.observer.on_player_list_changed(self.players.names());
                }
                self.stop_tunnel();
            }
        }
    }

    fn start_tunnel(&mut self) {
        if self.shutting_down || self.tunnel.is_running() {
            return;
        }
        if self.tunnel.start().is_ok() {
            self.append_line(display_text(StreamRole::Tunnel, "Starting tunnel..."));
            self.push_activity(ActivityKind::Info, "Tunnel started");
        }
    }

    fn stop_tunnel(&mut self) {
        let had_address = self.tunnel.address().is_some();
        if self.tunnel.stop() {
            self.append_line(display_text(StreamRole::Tunnel, "Tunnel stopped"));
            self.push_activity(ActivityKind::Info, "Tunnel stopped");
            if had_address {
                self.observer.on_tunnel_address_changed("");
            }
        }
    }

    fn record_backup(&mut self, timestamp: DateTime<Local>, outcome: &BackupOutcome) {
        self.backup_record.record(timestamp, outcome);
        let detail = outcome.detail();
        if outcome.success() {
            info!(%detail, "Backup completed");
        } else {
            warn!(%detail, "Backup failed");
            self.push_activity(ActivityKind::Warn, detail.clone());
        }
        self.append_line(display_text(StreamRole::Backup, &detail));
        self.observer
            .on_backup_completed(timestamp, outcome.success(), &detail);
    }

    fn append_manager(&mut self, text: &str) {
        self.append_line(format!("[Manager] {text}"));
    }

    fn append_line(&mut self, text: String) {
        let rendered = self.console.push(text).to_string();
        self.observer.on_line_appended(&rendered);
    }

    fn push_activity(&mut self, kind: ActivityKind, text: impl Into<String>) {
        let entry = ActivityEntry::now(kind, text);
        self.observer.on_activity(&entry);
        self.activity.push(entry);
    }
}
