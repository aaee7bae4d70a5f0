//! Core domain types and port definitions for hearth.
//!
//! Everything in this crate is pure: the server lifecycle state machine,
//! the event vocabulary shared by readers, backup workers and the
//! controller, the output classification rules, settings, and the port
//! traits adapters implement. Process spawning, pipes and the `git` binary
//! live in `hearth-runtime`.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod extract;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ActivityEntry, ActivityKind, ActivityLog, BACKUP_TIMESTAMP_FORMAT, BackupOutcome,
    BackupRecord, BackupStep, Lifecycle, MAX_ACTIVITY_ENTRIES, PlayerSet, ServerState,
};
pub use events::{Event, FailureKind, StreamRole};
pub use extract::{Extracted, OutputExtractor, RuleTable, classify};
pub use ports::{
    CommitResult, CoreError, NoopObserver, ProcessError, ServerObserver, VcsError,
    VersionControl,
};
pub use settings::{
    DEFAULT_BACKUP_INTERVAL_SECS, DEFAULT_MAX_CONSOLE_LINES, DEFAULT_TICK_INTERVAL_MS,
    DEFAULT_TUNNEL_DOMAIN, SETTINGS_FILE_NAME, Settings, SettingsError, SettingsUpdate,
    validate_settings,
};
