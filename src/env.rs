use crate::history::HistoryStore;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Session state shared between the interpreter and builtins.
///
/// The environment contains:
/// - `current_dir`: the working directory for command execution and completion.
/// - `should_exit`: set by the `exit` builtin to end the interactive loop.
/// - `history`: the command history of this session.
#[derive(Debug, Clone)]
pub struct Environment {
    pub current_dir: PathBuf,
    pub should_exit: bool,
    pub history: HistoryStore,
}

impl Environment {
    /// Capture the process working directory, with a default-sized history.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::at(current_dir)
    }

    /// Start in `dir` without touching the process working directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: dir.into(),
            should_exit: false,
            history: HistoryStore::default(),
        }
    }

    /// Resolve `path` against the current directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_env_resolves_relative_paths() {
        let env = Environment::at("/srv/data");
        assert_eq!(env.resolve("a.txt"), PathBuf::from("/srv/data/a.txt"));
        assert_eq!(env.resolve("/etc/hosts"), Path::new("/etc/hosts"));
        assert!(!env.should_exit);
        assert!(env.history.is_empty());
    }

    #[test]
    fn test_env_starts_in_an_absolute_directory() {
        let env = Environment::new();
        assert!(env.current_dir.is_absolute());
    }
}
