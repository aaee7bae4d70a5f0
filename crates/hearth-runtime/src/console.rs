//! Console display buffer.
//!
//! Holds the recent output shown to the user. The cap applies only to what
//! is kept for display; typed events are processed before their raw copy
//! ever reaches this buffer.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};
use hearth_core::{DEFAULT_MAX_CONSOLE_LINES, StreamRole};

/// A single console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl ConsoleLine {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            text: text.into(),
        }
    }
}

impl fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// Prefix a producer's line for display (`[Tunnel] ...`, `[Backup] ...`).
pub fn display_text(role: StreamRole, text: &str) -> String {
    match role.console_prefix() {
        Some(prefix) => format!("{prefix} {text}"),
        None => text.to_string(),
    }
}

/// Ring buffer of console lines, oldest dropped first.
#[derive(Debug)]
pub struct ConsoleBuffer {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
}

impl ConsoleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, removing the oldest if at capacity.
    pub fn push(&mut self, text: impl Into<String>) -> &ConsoleLine {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(ConsoleLine::now(text));
        &self.lines[self.lines.len() - 1]
    }

    pub fn lines(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONSOLE_LINES)
    }
}
