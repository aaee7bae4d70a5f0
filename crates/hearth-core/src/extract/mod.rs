//! Output event extraction.
//!
//! [`classify`] is the pure line classifier. [`OutputExtractor`] wraps it for
//! the lifetime of one child process: it always yields a raw display copy,
//! suppresses repeated startup signals, tags addresses with the child's
//! lifetime, and turns end-of-stream into exactly one `StatusStopped`.

mod rules;

use std::sync::Arc;

pub use rules::{RuleTable, classify};

use crate::events::{Event, StreamRole};

/// What one output line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Display copy of the line; always present.
    pub raw: Event,
    /// Typed event, if a rule matched.
    pub typed: Option<Event>,
}

/// Per-child extraction state.
///
/// Create one per spawned child; it is consumed by [`OutputExtractor::finish`]
/// when the child's output closes, so a lifetime can only end once.
#[derive(Debug)]
pub struct OutputExtractor {
    table: Arc<RuleTable>,
    lifetime: u64,
    running_reported: bool,
}

impl OutputExtractor {
    pub const fn new(table: Arc<RuleTable>, lifetime: u64) -> Self {
        Self {
            table,
            lifetime,
            running_reported: false,
        }
    }

    pub fn role(&self) -> StreamRole {
        self.table.role()
    }

    /// Classify one line of output.
    pub fn process(&mut self, line: &str) -> Extracted {
        let mut typed = classify(&self.table, line);

        match typed {
            Some(Event::StatusRunning) => {
                if self.running_reported {
                    typed = None;
                } else {
                    self.running_reported = true;
                }
            }
            Some(Event::TunnelAddressDetected {
                ref mut lifetime, ..
            }) => *lifetime = self.lifetime,
            _ => {}
        }

        Extracted {
            raw: Event::raw(self.role(), line),
            typed,
        }
    }

    /// End of this child's output.
    pub fn finish(self) -> Event {
        Event::StatusStopped {
            role: self.role(),
            lifetime: self.lifetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_extractor() -> OutputExtractor {
        OutputExtractor::new(Arc::new(RuleTable::server().unwrap()), 1)
    }

    #[test]
    fn test_raw_copy_always_present() {
        let mut extractor = server_extractor();
        let out = extractor.process("Bob joined the game");
        assert_eq!(out.raw, Event::raw(StreamRole::Server, "Bob joined the game"));
        assert_eq!(out.typed, Some(Event::player_joined("Bob")));

        let out = extractor.process("just noise");
        assert_eq!(out.raw, Event::raw(StreamRole::Server, "just noise"));
        assert_eq!(out.typed, None);
    }

    #[test]
    fn test_running_reported_once_per_lifetime() {
        let mut extractor = server_extractor();
        let line = "Done (1.0s)! For help, type \"help\"";
        assert_eq!(extractor.process(line).typed, Some(Event::StatusRunning));
        assert_eq!(extractor.process(line).typed, None);
        assert_eq!(extractor.process(line).typed, None);

        // A new child gets a fresh extractor.
        let mut next = server_extractor();
        assert_eq!(next.process(line).typed, Some(Event::StatusRunning));
    }

    #[test]
    fn test_address_tagged_with_lifetime() {
        let table = Arc::new(RuleTable::tunnel("playit.gg").unwrap());
        let mut extractor = OutputExtractor::new(table, 4);
        assert_eq!(
            extractor.process("address: calm-otter.playit.gg:5000").typed,
            Some(Event::tunnel_address("calm-otter.playit.gg:5000", 4))
        );
    }

    #[test]
    fn test_finish_reports_lifetime() {
        let extractor = OutputExtractor::new(Arc::new(RuleTable::tunnel("playit.gg").unwrap()), 7);
        assert_eq!(
            extractor.finish(),
            Event::StatusStopped {
                role: StreamRole::Tunnel,
                lifetime: 7
            }
        );
    }
}
