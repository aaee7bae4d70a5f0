//! Line-oriented observer that renders controller updates to a writer.

use std::io::Write;
use std::sync::Mutex;

use chrono::{DateTime, Local};
use hearth_core::{BACKUP_TIMESTAMP_FORMAT, ServerObserver, ServerState};

const HELP: &str = "\
Commands:
  :start     Start the server
  :stop      Stop the server
  :restart   Restart the server
  :backup    Run a backup now
  :tunnel    Start or stop the tunnel
  :help      Show this help
  :quit      Stop everything and exit
Anything else is sent to the server console.";

/// Print the interactive command reference.
pub fn print_help() {
    println!("{HELP}");
}

/// `Players: 2/20 online (Alice, Bob)`
pub fn format_players(players: &[String], max_players: u32) -> String {
    let count = format!("Players: {}/{max_players} online", players.len());
    if players.is_empty() {
        count
    } else {
        format!("{count} ({})", players.join(", "))
    }
}

/// The tunnel line; an empty address means it was cleared.
pub fn format_tunnel(address: &str) -> String {
    if address.is_empty() {
        "Tunnel: inactive".to_string()
    } else {
        format!("Tunnel: {address}")
    }
}

/// Renders every update as one line on the wrapped writer.
///
/// Console lines pass through unchanged; status, player and tunnel changes
/// get a `==` marker so they stand out from server output.
pub struct ConsoleObserver<W: Write + Send = std::io::Stdout> {
    out: Mutex<W>,
    max_players: u32,
}

impl ConsoleObserver {
    pub fn stdout(max_players: u32) -> Self {
        Self::new(std::io::stdout(), max_players)
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub const fn new(out: W, max_players: u32) -> Self {
        Self {
            out: Mutex::new(out),
            max_players,
        }
    }

    fn emit(&self, line: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        // A closed stdout is not worth stopping the server over.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    /// Unwrap the writer, for inspection in tests.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ServerObserver for ConsoleObserver<W> {
    fn on_status_changed(&self, state: ServerState) {
        self.emit(&format!("== Status: {}", state.label()));
    }

    fn on_line_appended(&self, text: &str) {
        self.emit(text);
    }

    fn on_player_list_changed(&self, players: &[String]) {
        self.emit(&format!("== {}", format_players(players, self.max_players)));
    }

    fn on_tunnel_address_changed(&self, address: &str) {
        self.emit(&format!("== {}", format_tunnel(address)));
    }

    fn on_backup_completed(&self, timestamp: DateTime<Local>, success: bool, _detail: &str) {
        let verdict = if success { "ok" } else { "FAILED" };
        self.emit(&format!(
            "== Backup {verdict} at {}",
            timestamp.format(BACKUP_TIMESTAMP_FORMAT)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rendered(f: impl FnOnce(&ConsoleObserver<Vec<u8>>)) -> String {
        let observer = ConsoleObserver::new(Vec::new(), 20);
        f(&observer);
        String::from_utf8(observer.into_inner()).unwrap()
    }

    #[test]
    fn test_format_players() {
        assert_eq!(format_players(&[], 20), "Players: 0/20 online");
        let players = vec!["Alice".to_string(), "Bob".to_string()];
        assert_eq!(
            format_players(&players, 10),
            "Players: 2/10 online (Alice, Bob)"
        );
    }

    #[test]
    fn test_format_tunnel() {
        assert_eq!(format_tunnel(""), "Tunnel: inactive");
        assert_eq!(
            format_tunnel("bold-dragon.playit.gg"),
            "Tunnel: bold-dragon.playit.gg"
        );
    }

    #[test]
    fn test_observer_output() {
        let out = rendered(|o| {
            o.on_line_appended("[12:00:00] Preparing level");
            o.on_status_changed(ServerState::Running);
            o.on_player_list_changed(&["Bob".to_string()]);
        });
        assert_eq!(
            out,
            "[12:00:00] Preparing level\n== Status: Online\n== Players: 1/20 online (Bob)\n"
        );
    }

    #[test]
    fn test_backup_line() {
        let when = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let out = rendered(|o| o.on_backup_completed(when, false, "push failed"));
        assert!(out.starts_with("== Backup FAILED at "));
    }
}
