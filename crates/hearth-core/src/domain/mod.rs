//! Domain types owned by the controller and the supervisor.

mod activity;
mod backup;
mod players;
mod state;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog, MAX_ACTIVITY_ENTRIES};
pub use backup::{BACKUP_TIMESTAMP_FORMAT, BackupOutcome, BackupRecord, BackupStep};
pub use players::PlayerSet;
pub use state::{Lifecycle, ServerState};
