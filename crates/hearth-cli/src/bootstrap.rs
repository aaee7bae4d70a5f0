//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Settings (file, then environment and flags)
//! - Tracing subscriber
//! - The runtime `Controller` with the `git` backup adapter
//! - The console observer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hearth_core::{SETTINGS_FILE_NAME, ServerObserver, Settings, SettingsUpdate, validate_settings};
use hearth_runtime::{Controller, ControllerHandle};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::parser::Cli;

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout stays the console view. `RUST_LOG` wins;
/// otherwise `--verbose` selects `debug` and the default is `warn`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Where the settings file is looked up, and whether it was asked for.
fn settings_path(cli: &Cli) -> (PathBuf, bool) {
    cli.settings.clone().map_or_else(
        || {
            let dir = cli.server_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            (dir.join(SETTINGS_FILE_NAME), false)
        },
        |path| (path, true),
    )
}

/// Read a settings file. A missing file is only an error when `required`.
pub fn read_settings_file(path: &Path, required: bool) -> Result<Settings, CliError> {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            debug!(path = %path.display(), "No settings file, using defaults");
            Ok(Settings::default())
        }
        Err(e) => Err(CliError::Io(format!("{}: {e}", path.display()))),
    }
}

/// Command-line and environment overrides as a partial update.
pub fn overrides(cli: &Cli) -> SettingsUpdate {
    SettingsUpdate {
        server_dir: cli.server_dir.clone().map(Some),
        java_path: cli.java_path.clone().map(Some),
        server_jar: cli.server_jar.clone().map(Some),
        tunnel_executable: cli.tunnel_executable.clone().map(Some),
        backup_interval_secs: cli.backup_interval_secs.map(Some),
        max_players: cli.max_players.map(Some),
        ..SettingsUpdate::default()
    }
}

/// Resolve the effective settings: file, then overrides, then validation.
pub fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    let (path, required) = settings_path(cli);
    let mut settings = read_settings_file(&path, required)?;
    settings.merge(&overrides(cli));
    validate_settings(&settings)?;
    Ok(settings)
}

/// Fully composed application context.
pub struct CliContext {
    pub settings: Settings,
    pub controller: Controller,
    pub handle: ControllerHandle,
}

/// Build the controller for `settings`.
pub fn bootstrap(
    settings: Settings,
    observer: Arc<dyn ServerObserver>,
) -> Result<CliContext, CliError> {
    let (controller, handle) = Controller::from_settings(&settings, observer)?;
    info!(
        server_dir = %settings.effective_server_dir().display(),
        "Controller ready"
    );
    Ok(CliContext {
        settings,
        controller,
        handle,
    })
}
