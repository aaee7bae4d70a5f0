//! Backup scheduling.
//!
//! The controller decides *when* (interval while running, or on request);
//! [`BackupScheduler::trigger`] runs the cycle on its own task and reports
//! the result back through the dispatch queue.

mod cycle;
mod git;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use hearth_core::{Event, StreamRole, VersionControl};
use tracing::{debug, info};

use crate::dispatch::EventSender;

pub use cycle::{
    BackupPlan, RETAINED_COMMITS, SQUASHED_COMMIT_MESSAGE, run_backup_cycle, snapshot_message,
};
pub use git::GitCli;

/// Why a cycle was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupTrigger {
    Interval,
    Manual,
}

/// Spawns backup cycles, at most one at a time.
pub struct BackupScheduler {
    vcs: Arc<dyn VersionControl>,
    plan: Arc<BackupPlan>,
    events: EventSender,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the worker finishes, even on panic.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BackupScheduler {
    pub fn new(vcs: Arc<dyn VersionControl>, plan: BackupPlan, events: EventSender) -> Self {
        Self {
            vcs,
            plan: Arc::new(plan),
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a cycle is currently running.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a cycle on a worker task.
    ///
    /// Returns `false` (and starts nothing) while another cycle is still
    /// running. The worker is never awaited; its result arrives as
    /// `BackupCompleted`.
    pub fn trigger(&self, reason: BackupTrigger) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(?reason, "Backup already running, trigger skipped");
            return false;
        }
        info!(?reason, "Starting backup cycle");

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let vcs = Arc::clone(&self.vcs);
        let plan = Arc::clone(&self.plan);
        let events = self.events.clone();

        tokio::spawn(async move {
            events.send(Event::raw(StreamRole::Backup, "Starting backup..."));
            let outcome = run_backup_cycle(vcs.as_ref(), &plan, Local::now(), &events).await;
            drop(guard);
            events.send(Event::BackupCompleted {
                timestamp: Local::now(),
                outcome,
            });
        });
        true
    }
}
