//! Settings domain types and validation.
//!
//! This module contains the settings shared by the runtime and its adapters.
//! These are pure domain types with no infrastructure dependencies; loading
//! them from disk or the environment is the adapter's job.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name looked up in the server directory when no path is given.
pub const SETTINGS_FILE_NAME: &str = "hearth.json";

/// Default controller tick.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Default automatic backup interval (10 minutes).
pub const DEFAULT_BACKUP_INTERVAL_SECS: u64 = 600;

/// Default console line ceiling.
pub const DEFAULT_MAX_CONSOLE_LINES: usize = 500;

/// Default tunnel address domain.
pub const DEFAULT_TUNNEL_DOMAIN: &str = "playit.gg";

const DEFAULT_JAVA: &str = "java";
const DEFAULT_JAVA_ARGS: [&str; 3] = ["-Xms1G", "-Xmx2G", "-XX:+UseG1GC"];
const DEFAULT_SERVER_JAR: &str = "server.jar";
const DEFAULT_SERVER_ARGS: [&str; 1] = ["nogui"];
const DEFAULT_STOP_COMMAND: &str = "stop";
const DEFAULT_TUNNEL_EXECUTABLE: &str = "playit";
const DEFAULT_GIT: &str = "git";
const DEFAULT_RESTART_DELAY_MS: u64 = 1000;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 3;
const DEFAULT_MAX_PLAYERS: u32 = 20;

/// Application settings structure.
///
/// All fields are optional to support partial files and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory containing the server jar; also the backed-up repository.
    pub server_dir: Option<PathBuf>,

    /// Java executable.
    pub java_path: Option<String>,

    /// JVM arguments placed before `-jar`.
    pub java_args: Option<Vec<String>>,

    /// Server jar, relative to `server_dir`.
    pub server_jar: Option<String>,

    /// Arguments placed after the jar.
    pub server_args: Option<Vec<String>>,

    /// Line written to the server's input for a graceful stop.
    pub stop_command: Option<String>,

    /// Tunnel executable; relative paths resolve against `server_dir`.
    pub tunnel_executable: Option<PathBuf>,

    /// Domain the tunnel's public addresses live under.
    pub tunnel_domain: Option<String>,

    /// Version-control executable.
    pub git_path: Option<String>,

    /// Seconds between automatic backups.
    pub backup_interval_secs: Option<u64>,

    /// Controller tick in milliseconds.
    pub tick_interval_ms: Option<u64>,

    /// Delay before the deferred start of a restart.
    pub restart_delay_ms: Option<u64>,

    /// Grace period for a graceful stop at application exit.
    pub shutdown_grace_secs: Option<u64>,

    /// Console lines kept for display.
    pub max_console_lines: Option<usize>,

    /// Player capacity shown next to the online count.
    pub max_players: Option<u32>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            server_dir: Some(PathBuf::from(".")),
            java_path: Some(DEFAULT_JAVA.to_string()),
            java_args: Some(DEFAULT_JAVA_ARGS.iter().map(ToString::to_string).collect()),
            server_jar: Some(DEFAULT_SERVER_JAR.to_string()),
            server_args: Some(DEFAULT_SERVER_ARGS.iter().map(ToString::to_string).collect()),
            stop_command: Some(DEFAULT_STOP_COMMAND.to_string()),
            tunnel_executable: None,
            tunnel_domain: Some(DEFAULT_TUNNEL_DOMAIN.to_string()),
            git_path: Some(DEFAULT_GIT.to_string()),
            backup_interval_secs: Some(DEFAULT_BACKUP_INTERVAL_SECS),
            tick_interval_ms: Some(DEFAULT_TICK_INTERVAL_MS),
            restart_delay_ms: Some(DEFAULT_RESTART_DELAY_MS),
            shutdown_grace_secs: Some(DEFAULT_SHUTDOWN_GRACE_SECS),
            max_console_lines: Some(DEFAULT_MAX_CONSOLE_LINES),
            max_players: Some(DEFAULT_MAX_PLAYERS),
        }
    }

    /// Get the effective server directory.
    pub fn effective_server_dir(&self) -> PathBuf {
        self.server_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Program and argument vector used to launch the server.
    ///
    /// `<java> <java_args...> -jar <server_jar> <server_args...>`
    pub fn server_argv(&self) -> (String, Vec<String>) {
        let program = self
            .java_path
            .clone()
            .unwrap_or_else(|| DEFAULT_JAVA.to_string());

        let mut args: Vec<String> = self.java_args.clone().unwrap_or_else(|| {
            DEFAULT_JAVA_ARGS.iter().map(ToString::to_string).collect()
        });
        args.push("-jar".to_string());
        args.push(
            self.server_jar
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVER_JAR.to_string()),
        );
        args.extend(self.server_args.clone().unwrap_or_else(|| {
            DEFAULT_SERVER_ARGS.iter().map(ToString::to_string).collect()
        }));

        (program, args)
    }

    /// Get the effective graceful stop command.
    pub fn effective_stop_command(&self) -> &str {
        self.stop_command.as_deref().unwrap_or(DEFAULT_STOP_COMMAND)
    }

    /// Get the tunnel executable, resolved against the server directory.
    pub fn effective_tunnel_executable(&self) -> PathBuf {
        let configured = self.tunnel_executable.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{DEFAULT_TUNNEL_EXECUTABLE}{}",
                std::env::consts::EXE_SUFFIX
            ))
        });
        resolve_against(&self.effective_server_dir(), configured)
    }

    /// Get the effective tunnel domain.
    pub fn effective_tunnel_domain(&self) -> &str {
        self.tunnel_domain
            .as_deref()
            .unwrap_or(DEFAULT_TUNNEL_DOMAIN)
    }

    /// Get the effective version-control executable.
    pub fn effective_git_path(&self) -> &str {
        self.git_path.as_deref().unwrap_or(DEFAULT_GIT)
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(
            self.backup_interval_secs
                .unwrap_or(DEFAULT_BACKUP_INTERVAL_SECS),
        )
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS))
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms.unwrap_or(DEFAULT_RESTART_DELAY_MS))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_grace_secs
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
        )
    }

    pub fn effective_max_console_lines(&self) -> usize {
        self.max_console_lines.unwrap_or(DEFAULT_MAX_CONSOLE_LINES)
    }

    pub fn effective_max_players(&self) -> u32 {
        self.max_players.unwrap_or(DEFAULT_MAX_PLAYERS)
    }

    /// Fill every unset field from [`Settings::with_defaults`].
    #[must_use]
    pub fn or_defaults(self) -> Self {
        let d = Self::with_defaults();
        Self {
            server_dir: self.server_dir.or(d.server_dir),
            java_path: self.java_path.or(d.java_path),
            java_args: self.java_args.or(d.java_args),
            server_jar: self.server_jar.or(d.server_jar),
            server_args: self.server_args.or(d.server_args),
            stop_command: self.stop_command.or(d.stop_command),
            tunnel_executable: self.tunnel_executable.or(d.tunnel_executable),
            tunnel_domain: self.tunnel_domain.or(d.tunnel_domain),
            git_path: self.git_path.or(d.git_path),
            backup_interval_secs: self.backup_interval_secs.or(d.backup_interval_secs),
            tick_interval_ms: self.tick_interval_ms.or(d.tick_interval_ms),
            restart_delay_ms: self.restart_delay_ms.or(d.restart_delay_ms),
            shutdown_grace_secs: self.shutdown_grace_secs.or(d.shutdown_grace_secs),
            max_console_lines: self.max_console_lines.or(d.max_console_lines),
            max_players: self.max_players.or(d.max_players),
        }
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref dir) = other.server_dir {
            self.server_dir.clone_from(dir);
        }
        if let Some(ref java) = other.java_path {
            self.java_path.clone_from(java);
        }
        if let Some(ref args) = other.java_args {
            self.java_args.clone_from(args);
        }
        if let Some(ref jar) = other.server_jar {
            self.server_jar.clone_from(jar);
        }
        if let Some(ref args) = other.server_args {
            self.server_args.clone_from(args);
        }
        if let Some(ref cmd) = other.stop_command {
            self.stop_command.clone_from(cmd);
        }
        if let Some(ref exe) = other.tunnel_executable {
            self.tunnel_executable.clone_from(exe);
        }
        if let Some(ref domain) = other.tunnel_domain {
            self.tunnel_domain.clone_from(domain);
        }
        if let Some(ref git) = other.git_path {
            self.git_path.clone_from(git);
        }
        if let Some(secs) = other.backup_interval_secs {
            self.backup_interval_secs = secs;
        }
        if let Some(ms) = other.tick_interval_ms {
            self.tick_interval_ms = ms;
        }
        if let Some(ms) = other.restart_delay_ms {
            self.restart_delay_ms = ms;
        }
        if let Some(secs) = other.shutdown_grace_secs {
            self.shutdown_grace_secs = secs;
        }
        if let Some(lines) = other.max_console_lines {
            self.max_console_lines = lines;
        }
        if let Some(players) = other.max_players {
            self.max_players = players;
        }
    }
}

fn resolve_against(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub server_dir: Option<Option<PathBuf>>,
    pub java_path: Option<Option<String>>,
    pub java_args: Option<Option<Vec<String>>>,
    pub server_jar: Option<Option<String>>,
    pub server_args: Option<Option<Vec<String>>>,
    pub stop_command: Option<Option<String>>,
    pub tunnel_executable: Option<Option<PathBuf>>,
    pub tunnel_domain: Option<Option<String>>,
    pub git_path: Option<Option<String>>,
    pub backup_interval_secs: Option<Option<u64>>,
    pub tick_interval_ms: Option<Option<u64>>,
    pub restart_delay_ms: Option<Option<u64>>,
    pub shutdown_grace_secs: Option<Option<u64>>,
    pub max_console_lines: Option<Option<usize>>,
    pub max_players: Option<Option<u32>>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Tick interval must be between 10 and 10,000 ms, got {0}")]
    InvalidTickInterval(u64),

    #[error("Backup interval must be at least 60 seconds, got {0}")]
    InvalidBackupInterval(u64),

    #[error("Console line limit must be between 50 and 100,000, got {0}")]
    InvalidConsoleLines(usize),

    #[error("Max players must be between 1 and 1000, got {0}")]
    InvalidMaxPlayers(u32),

    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(ms) = settings.tick_interval_ms {
        if !(10..=10_000).contains(&ms) {
            return Err(SettingsError::InvalidTickInterval(ms));
        }
    }

    if let Some(secs) = settings.backup_interval_secs {
        if secs < 60 {
            return Err(SettingsError::InvalidBackupInterval(secs));
        }
    }

    if let Some(lines) = settings.max_console_lines {
        if !(50..=100_000).contains(&lines) {
            return Err(SettingsError::InvalidConsoleLines(lines));
        }
    }

    if let Some(players) = settings.max_players {
        if !(1..=1000).contains(&players) {
            return Err(SettingsError::InvalidMaxPlayers(players));
        }
    }

    let required = [
        ("Server jar", settings.server_jar.as_deref()),
        ("Java path", settings.java_path.as_deref()),
        ("Stop command", settings.stop_command.as_deref()),
        ("Tunnel domain", settings.tunnel_domain.as_deref()),
    ];
    for (name, value) in required {
        if value.is_some_and(|v| v.trim().is_empty()) {
            return Err(SettingsError::Empty(name));
        }
    }

    Ok(())
}
