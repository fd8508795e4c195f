//! In-memory command history with `!n` recall.
//!
//! Entries are numbered from 1 in the order they were recorded, and a number
//! keeps pointing at the same entry for the whole session. Once the store is
//! full the oldest entry is evicted and its number stops resolving.

use regex::Regex;
use std::collections::VecDeque;
use std::sync::LazyLock;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 50;

static RECALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^!(\d+)").expect("valid regex"));

/// Bounded, insertion-ordered log of command lines.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<String>,
    capacity: usize,
    /// Number of entries ever recorded, evicted ones included.
    recorded: usize,
}

/// Result of looking for a `!n` reference at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recall {
    /// The line does not start with `!n`.
    NotRequested,
    /// The line is replaced by this history entry.
    Found(String),
    /// `!n` named an entry that does not exist or was evicted.
    Missing(usize),
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            recorded: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical number of the oldest resident entry.
    fn first_index(&self) -> usize {
        self.recorded - self.entries.len() + 1
    }

    /// Append a line, dropping one trailing newline. Empty lines are ignored.
    pub fn record(&mut self, line: &str) {
        let line = line.strip_suffix('\n').unwrap_or(line);
        if line.is_empty() {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
        self.recorded += 1;
    }

    /// Look up entry `n` (1-based, counting every entry ever recorded).
    pub fn recall(&self, n: usize) -> Option<&str> {
        if n == 0 || n > self.recorded || n < self.first_index() {
            return None;
        }
        self.entries
            .get(n - self.first_index())
            .map(String::as_str)
    }

    /// Resident entries with their logical numbers, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        let first = self.first_index();
        self.entries
            .iter()
            .enumerate()
            .map(move |(i, line)| (first + i, line.as_str()))
    }

    /// Resolve a leading `!n` against this store.
    ///
    /// Anything following the digits is discarded along with the reference
    /// itself: the recalled entry replaces the entire line.
    pub fn resolve_recall(&self, line: &str) -> Recall {
        let Some(caps) = RECALL.captures(line) else {
            return Recall::NotRequested;
        };
        // a number too long for usize can't name a recorded entry anyway
        let n = caps[1].parse::<usize>().unwrap_or(usize::MAX);
        match self.recall(n) {
            Some(entry) => Recall::Found(entry.to_string()),
            None => Recall::Missing(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(cap: usize, lines: &[&str]) -> HistoryStore {
        let mut h = HistoryStore::with_capacity(cap);
        for line in lines {
            h.record(line);
        }
        h
    }

    #[test]
    fn test_eviction_keeps_logical_numbers() {
        let h = store(2, &["a", "b", "c"]);
        let resident: Vec<_> = h.iter().collect();
        assert_eq!(resident, vec![(2, "b"), (3, "c")]);
        assert_eq!(h.recall(1), None);
        assert_eq!(h.recall(2), Some("b"));
        assert_eq!(h.recall(3), Some("c"));
        assert_eq!(h.recall(4), None);
        assert_eq!(h.recall(0), None);
    }

    #[test]
    fn test_record_trims_newline_and_skips_empty() {
        let h = store(5, &["ls\n", "", "\n", "pwd"]);
        assert_eq!(h.len(), 2);
        assert_eq!(h.recall(1), Some("ls"));
        assert_eq!(h.recall(2), Some("pwd"));
    }

    #[test]
    fn test_iter_is_restartable() {
        let h = store(5, &["one", "two"]);
        let first: Vec<_> = h.iter().collect();
        let second: Vec<_> = h.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![(1, "one"), (2, "two")]);
    }

    #[test]
    fn test_resolve_recall() {
        let h = store(50, &["ls", "pwd"]);
        assert_eq!(h.resolve_recall("!2"), Recall::Found("pwd".to_string()));
        assert_eq!(h.resolve_recall("!1 ignored"), Recall::Found("ls".to_string()));
        assert_eq!(h.resolve_recall("!9"), Recall::Missing(9));
        assert_eq!(h.resolve_recall("!x"), Recall::NotRequested);
        assert_eq!(h.resolve_recall("echo !1"), Recall::NotRequested);
        assert_eq!(
            h.resolve_recall("!99999999999999999999999"),
            Recall::Missing(usize::MAX)
        );
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let h = store(0, &["a", "b"]);
        assert_eq!(h.capacity(), 1);
        assert_eq!(h.recall(2), Some("b"));
    }
}
