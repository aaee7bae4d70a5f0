//! Recent activity feed (joins, leaves, lifecycle notices).

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Number of activity entries retained.
pub const MAX_ACTIVITY_ENTRIES: usize = 10;

/// Category of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Join,
    Leave,
    Info,
    Warn,
}

/// A single activity entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl ActivityEntry {
    /// Create an entry stamped with the current local time.
    pub fn now(kind: ActivityKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}

/// Bounded feed of the most recent activity, oldest first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest once at capacity.
    pub fn push(&mut self, entry: ActivityEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(MAX_ACTIVITY_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut log = ActivityLog::new(3);
        for i in 0..5 {
            log.push(ActivityEntry::now(ActivityKind::Info, format!("entry {i}")));
        }
        let texts: Vec<&str> = log.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_default_capacity() {
        let mut log = ActivityLog::default();
        for _ in 0..25 {
            log.push(ActivityEntry::now(ActivityKind::Join, "Bob joined"));
        }
        assert_eq!(log.len(), MAX_ACTIVITY_ENTRIES);
    }
}
