//! Process runtime and OS-level concerns for hearth.
//!
//! Adapters around `hearth-core`: the dispatch queue, child process
//! supervision with output readers, the `git` backup adapter and scheduler,
//! and the [`Controller`] loop that ties them together.

#![deny(unsafe_code)]

pub mod backup;
pub mod console;
pub mod controller;
pub mod dispatch;
pub mod process;

pub use backup::{BackupPlan, BackupScheduler, BackupTrigger, GitCli, run_backup_cycle};
pub use console::{ConsoleBuffer, ConsoleLine, display_text};
pub use controller::{
    ControlRequest, Controller, ControllerClosed, ControllerConfig, ControllerHandle,
};
pub use dispatch::{EventReceiver, EventSender, event_queue};
pub use process::{ServerLaunch, ServerSupervisor, TunnelLaunch, TunnelManager};
