//! Command-line interface definition.
//!
//! Every option can also come from the environment (or a `.env` file), and
//! overrides the matching key of the settings file.

use std::path::PathBuf;

use clap::Parser;

/// Supervise a game server, its tunnel and its off-site backups.
#[derive(Debug, Parser)]
#[command(name = "hearth")]
#[command(about = "Supervise a game server, its tunnel and its off-site backups")]
#[command(version)]
pub struct Cli {
    /// Server directory (contains the jar; backed up with git)
    #[arg(short = 'd', long = "server-dir", env = "HEARTH_SERVER_DIR")]
    pub server_dir: Option<PathBuf>,

    /// Settings file (default: <server-dir>/hearth.json)
    #[arg(short = 'c', long = "settings", env = "HEARTH_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Java executable
    #[arg(long = "java", env = "HEARTH_JAVA")]
    pub java_path: Option<String>,

    /// Server jar, relative to the server directory
    #[arg(long = "jar", env = "HEARTH_SERVER_JAR")]
    pub server_jar: Option<String>,

    /// Tunnel agent executable
    #[arg(long = "tunnel", env = "HEARTH_TUNNEL")]
    pub tunnel_executable: Option<PathBuf>,

    /// Seconds between automatic backups while the server is online
    #[arg(long = "backup-interval", env = "HEARTH_BACKUP_INTERVAL")]
    pub backup_interval_secs: Option<u64>,

    /// Player capacity shown next to the online count
    #[arg(long = "max-players", env = "HEARTH_MAX_PLAYERS")]
    pub max_players: Option<u32>,

    /// Start the server immediately
    #[arg(long = "start")]
    pub start: bool,

    /// Print the effective settings as JSON and exit
    #[arg(long = "print-settings")]
    pub print_settings: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_parse() {
        let cli = Cli::parse_from([
            "hearth",
            "--verbose",
            "--server-dir",
            "/srv/mc",
            "--jar",
            "paper.jar",
            "--backup-interval",
            "900",
            "--start",
        ]);
        assert!(cli.verbose);
        assert!(cli.start);
        assert_eq!(cli.server_dir, Some(PathBuf::from("/srv/mc")));
        assert_eq!(cli.server_jar.as_deref(), Some("paper.jar"));
        assert_eq!(cli.backup_interval_secs, Some(900));
    }
}
