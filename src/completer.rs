//! Filename completion for the word under the cursor.

use std::fs;
use std::path::Path;
use tracing::warn;

/// Default upper bound on the number of candidates collected.
pub const DEFAULT_MATCH_LIMIT: usize = 50;

/// What a completion request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Nothing in the directory starts with the current word.
    NoMatch,
    /// Exactly one candidate: the text to append to the buffer.
    Unique(String),
    /// Several candidates, sorted by name.
    Ambiguous(Vec<String>),
}

/// The word being completed: everything after the last space in `buffer`.
pub fn current_word(buffer: &str) -> &str {
    buffer.rsplit(' ').next().unwrap_or(buffer)
}

/// Complete the last word of `buffer` against the entries of `dir`.
///
/// Matching is a case-sensitive prefix test on entry names. At most `limit`
/// candidates are listed; extra matches are dropped without notice. A prefix
/// shared by several entries is never completed, however small `limit` is.
pub fn complete(dir: &Path, buffer: &str, limit: usize) -> Completion {
    let word = current_word(buffer);

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot list directory for completion");
            return Completion::NoMatch;
        }
    };

    let mut matches: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(word))
        .collect();
    matches.sort();

    match matches.len() {
        0 => Completion::NoMatch,
        1 => {
            let name = matches.remove(0);
            Completion::Unique(name[word.len()..].to_string())
        }
        _ => {
            matches.truncate(limit);
            Completion::Ambiguous(matches)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn dir_with(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            File::create(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[test]
    fn test_current_word_is_suffix_after_last_space() {
        assert_eq!(current_word("cat fo"), "fo");
        assert_eq!(current_word("cat "), "");
        assert_eq!(current_word("ls"), "ls");
    }

    #[test]
    fn test_ambiguous_prefix_lists_all() {
        let dir = dir_with(&["foo.txt", "foobar.txt", "other"]);
        assert_eq!(
            complete(dir.path(), "cat fo", DEFAULT_MATCH_LIMIT),
            Completion::Ambiguous(vec!["foo.txt".to_string(), "foobar.txt".to_string()])
        );
    }

    #[test]
    fn test_unique_prefix_returns_remainder() {
        let dir = dir_with(&["foo.txt", "foobar.txt"]);
        assert_eq!(
            complete(dir.path(), "cat foo.", DEFAULT_MATCH_LIMIT),
            Completion::Unique("txt".to_string())
        );
    }

    #[test]
    fn test_no_match_and_case_sensitivity() {
        let dir = dir_with(&["Makefile"]);
        assert_eq!(complete(dir.path(), "make", DEFAULT_MATCH_LIMIT), Completion::NoMatch);
        assert_eq!(
            complete(dir.path(), "Make", DEFAULT_MATCH_LIMIT),
            Completion::Unique("file".to_string())
        );
    }

    #[test]
    fn test_limit_drops_extra_matches() {
        let dir = dir_with(&["a1", "a2", "a3"]);
        assert_eq!(
            complete(dir.path(), "a", 2),
            Completion::Ambiguous(vec!["a1".to_string(), "a2".to_string()])
        );
    }

    #[test]
    fn test_limit_never_turns_ambiguity_into_completion() {
        let dir = dir_with(&["a1", "a2"]);
        assert_eq!(
            complete(dir.path(), "a", 1),
            Completion::Ambiguous(vec!["a1".to_string()])
        );
    }

    #[test]
    fn test_unreadable_directory_is_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert_eq!(complete(&missing, "x", DEFAULT_MATCH_LIMIT), Completion::NoMatch);
    }
}
