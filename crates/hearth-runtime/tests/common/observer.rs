//! Observer that records every callback.

use std::sync::Mutex;

use chrono::{DateTime, Local};
use hearth_core::{ActivityEntry, ServerObserver, ServerState};

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub states: Mutex<Vec<ServerState>>,
    pub lines: Mutex<Vec<String>>,
    pub player_lists: Mutex<Vec<Vec<String>>>,
    pub addresses: Mutex<Vec<String>>,
    pub backups: Mutex<Vec<(bool, String)>>,
    pub activity: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<ServerState> {
        self.states.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn player_lists(&self) -> Vec<Vec<String>> {
        self.player_lists.lock().unwrap().clone()
    }

    pub fn backups(&self) -> Vec<(bool, String)> {
        self.backups.lock().unwrap().clone()
    }

    /// Whether any console line contains `needle`.
    pub fn saw_line(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl ServerObserver for RecordingObserver {
    fn on_status_changed(&self, state: ServerState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_line_appended(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }

    fn on_player_list_changed(&self, players: &[String]) {
        self.player_lists.lock().unwrap().push(players.to_vec());
    }

    fn on_tunnel_address_changed(&self, address: &str) {
        self.addresses.lock().unwrap().push(address.to_string());
    }

    fn on_backup_completed(&self, _timestamp: DateTime<Local>, success: bool, detail: &str) {
        self.backups
            .lock()
            .unwrap()
            .push((success, detail.to_string()));
    }

    fn on_activity(&self, entry: &ActivityEntry) {
        self.activity.lock().unwrap().push(entry.text.clone());
    }
}
