//! Ordered pattern tables for output classification.
//!
//! A table is a list of `(matcher, constructor)` rules evaluated in order;
//! the first rule that matches produces the line's typed event. Adding a
//! signal means adding a row, not another branch.

use regex::Regex;

use crate::events::{Event, StreamRole};

/// First half of the vanilla server's startup line: `Done (3.2s)!`.
const STARTUP_MARKER: &str = "Done";
/// Second half: `For help, type "help"`.
const HELP_MARKER: &str = "For help";
/// Keywords that unlock the looser tunnel address pattern.
const ADDRESS_KEYWORDS: &[&str] = &["address", "connect"];

/// How a rule recognises a line and what payload it extracts.
#[derive(Debug)]
enum Matcher {
    /// Every marker appears somewhere in the line. No payload.
    AllOf(&'static [&'static str]),
    /// First capture group of the first match.
    Capture(Regex),
    /// Longest whole match anywhere in the line.
    Longest(Regex),
    /// Longest whole match, only tried when the line mentions a keyword
    /// (case-insensitive).
    Gated {
        keywords: &'static [&'static str],
        pattern: Regex,
    },
}

impl Matcher {
    fn find(&self, line: &str) -> Option<String> {
        match self {
            Self::AllOf(markers) => markers
                .iter()
                .all(|m| line.contains(m))
                .then(String::new),
            Self::Capture(re) => re
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            Self::Longest(re) => longest_match(re, line),
            Self::Gated { keywords, pattern } => {
                let lowered = line.to_lowercase();
                if keywords.iter().any(|k| lowered.contains(k)) {
                    longest_match(pattern, line)
                } else {
                    None
                }
            }
        }
    }
}

fn longest_match(re: &Regex, line: &str) -> Option<String> {
    let mut best: Option<&str> = None;
    for m in re.find_iter(line) {
        if best.is_none_or(|b| m.as_str().len() > b.len()) {
            best = Some(m.as_str());
        }
    }
    best.map(str::to_string)
}

/// One row of a rule table.
#[derive(Debug)]
struct Rule {
    name: &'static str,
    matcher: Matcher,
    build: fn(String) -> Event,
}

/// Ordered classification rules for one stream role.
#[derive(Debug)]
pub struct RuleTable {
    role: StreamRole,
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Rules for the game server's output.
    pub fn server() -> Result<Self, regex::Error> {
        Ok(Self {
            role: StreamRole::Server,
            rules: vec![
                Rule {
                    name: "startup_complete",
                    matcher: Matcher::AllOf(&[STARTUP_MARKER, HELP_MARKER]),
                    build: |_| Event::StatusRunning,
                },
                Rule {
                    name: "player_joined",
                    matcher: Matcher::Capture(Regex::new(r"(\w+) joined the game")?),
                    build: |name| Event::PlayerJoined { name },
                },
                Rule {
                    name: "player_left",
                    matcher: Matcher::Capture(Regex::new(r"(\w+) left the game")?),
                    build: |name| Event::PlayerLeft { name },
                },
            ],
        })
    }

    /// Rules for the tunnel's output, for addresses under `domain`.
    pub fn tunnel(domain: &str) -> Result<Self, regex::Error> {
        let domain = regex::escape(domain);
        Ok(Self {
            role: StreamRole::Tunnel,
            rules: vec![
                Rule {
                    name: "tunnel_address",
                    matcher: Matcher::Longest(Regex::new(&format!(
                        r"[a-zA-Z0-9-]+\.{domain}(?::\d+)?"
                    ))?),
                    build: |address| Event::tunnel_address(address, 0),
                },
                Rule {
                    name: "tunnel_address_loose",
                    matcher: Matcher::Gated {
                        keywords: ADDRESS_KEYWORDS,
                        pattern: Regex::new(&format!(r"\S+\.{domain}(?::\d+)?"))?,
                    },
                    build: |address| Event::tunnel_address(address, 0),
                },
            ],
        })
    }

    /// Table for `role`. Backup progress lines are never classified.
    pub fn for_role(role: StreamRole, tunnel_domain: &str) -> Result<Self, regex::Error> {
        match role {
            StreamRole::Server => Self::server(),
            StreamRole::Tunnel => Self::tunnel(tunnel_domain),
            StreamRole::Backup => Ok(Self {
                role,
                rules: Vec::new(),
            }),
        }
    }

    pub const fn role(&self) -> StreamRole {
        self.role
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }
}

/// Classify one line against a table.
///
/// Returns the typed event of the first matching rule, or `None` when the
/// line is ordinary output (the common case, not an error). Address events
/// come back with lifetime `0`; [`OutputExtractor`](super::OutputExtractor)
/// stamps the real one.
pub fn classify(table: &RuleTable, line: &str) -> Option<Event> {
    table
        .rules
        .iter()
        .find_map(|rule| rule.matcher.find(line).map(rule.build))
}
