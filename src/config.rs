use crate::completer::DEFAULT_MATCH_LIMIT;
use crate::history::DEFAULT_CAPACITY;

/// Default prompt printed before each interactive line.
pub const DEFAULT_PROMPT: &str = "utsh$ ";

/// Tunables of an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    /// Number of history entries kept before the oldest is evicted.
    pub history_capacity: usize,
    /// Maximum number of Tab completion candidates.
    pub completion_limit: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history_capacity: DEFAULT_CAPACITY,
            completion_limit: DEFAULT_MATCH_LIMIT,
        }
    }
}
