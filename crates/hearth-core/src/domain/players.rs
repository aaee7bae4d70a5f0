use serde::{Deserialize, Serialize};

/// Online players in join order.
///
/// Joining twice is idempotent and leaving an absent name is a no-op; both
/// report whether the set actually changed so callers only notify on change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSet {
    names: Vec<String>,
}

impl PlayerSet {
    pub const fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Record a join. Returns `false` if the name was already present.
    pub fn join(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Record a leave. Returns `false` if the name was not present.
    pub fn leave(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Drop everyone (server went offline). Returns `false` if already empty.
    pub fn clear(&mut self) -> bool {
        if self.names.is_empty() {
            return false;
        }
        self.names.clear();
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_then_leave() {
        let mut players = PlayerSet::new();
        assert!(players.join("Bob"));
        assert_eq!(players.names(), ["Bob".to_string()]);

        assert!(players.leave("Bob"));
        assert!(players.is_empty());
    }

    #[test]
    fn test_duplicate_join_is_idempotent() {
        let mut players = PlayerSet::new();
        players.join("Alex");
        players.join("Bob");
        let before = players.clone();

        assert!(!players.join("Bob"));
        assert_eq!(players, before);
    }

    #[test]
    fn test_leave_absent_is_noop() {
        let mut players = PlayerSet::new();
        players.join("Alex");
        assert!(!players.leave("Steve"));
        assert_eq!(players.len(), 1);
    }

    #[test]
    fn test_join_order_preserved() {
        let mut players = PlayerSet::new();
        for name in ["Zed", "Amy", "Kim"] {
            players.join(name);
        }
        assert_eq!(players.names(), ["Zed", "Amy", "Kim"]);
    }

    #[test]
    fn test_clear_reports_change() {
        let mut players = PlayerSet::new();
        assert!(!players.clear());
        players.join("Bob");
        assert!(players.clear());
        assert!(players.is_empty());
    }
}
