//! Observer port for the presentation layer.
//!
//! The controller is the only caller. Presentation adapters (terminal,
//! desktop, web) implement this trait to render state; they hold no
//! lifecycle logic of their own.

use chrono::{DateTime, Local};

use crate::domain::{ActivityEntry, ServerState};

/// Receives state changes from the controller.
///
/// # Design
///
/// - **Object-safe**: held as `Arc<dyn ServerObserver>`
/// - **Fire-and-forget**: no `Result`; adapters handle their own errors
/// - **Non-blocking**: called from the controller tick, so implementations
///   must return promptly
pub trait ServerObserver: Send + Sync {
    /// The server lifecycle state changed.
    fn on_status_changed(&self, state: ServerState);

    /// A console line was appended (already timestamped and prefixed).
    fn on_line_appended(&self, text: &str);

    /// The online player list changed.
    fn on_player_list_changed(&self, players: &[String]);

    /// The tunnel address changed; empty when cleared.
    fn on_tunnel_address_changed(&self, address: &str);

    /// A backup cycle completed.
    fn on_backup_completed(&self, timestamp: DateTime<Local>, success: bool, detail: &str);

    /// An entry was added to the recent-activity feed.
    fn on_activity(&self, _entry: &ActivityEntry) {}
}

/// An observer that discards everything, for tests and headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ServerObserver for NoopObserver {
    fn on_status_changed(&self, _state: ServerState) {}

    fn on_line_appended(&self, _text: &str) {}

    fn on_player_list_changed(&self, _players: &[String]) {}

    fn on_tunnel_address_changed(&self, _address: &str) {}

    fn on_backup_completed(&self, _timestamp: DateTime<Local>, _success: bool, _detail: &str) {}
}
