//! Wildcard expansion of command arguments.
//!
//! Every argument after the program name that contains `*`, `?` or `[` is
//! matched against the filesystem. An argument that matches nothing, or is not
//! a valid pattern, is passed through literally.

use crate::parser::Command;
use glob::{MatchOptions, Pattern};
use std::path::Path;
use tracing::debug;

const WILDCARDS: [char; 3] = ['*', '?', '['];

/// True if `word` would be treated as a glob pattern.
pub fn has_wildcard(word: &str) -> bool {
    word.contains(WILDCARDS)
}

/// Expand a single pattern relative to `cwd`.
///
/// Relative patterns produce relative paths, as if the match had run inside `cwd`.
/// Returns the pattern itself when nothing matches.
pub fn expand_word(word: &str, cwd: &Path) -> Vec<String> {
    let relative = Path::new(word).is_relative();
    let pattern = if relative {
        format!(
            "{}/{}",
            Pattern::escape(&cwd.to_string_lossy()).trim_end_matches('/'),
            word
        )
    } else {
        word.to_string()
    };

    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let paths = match glob::glob_with(&pattern, options) {
        Ok(paths) => paths,
        Err(e) => {
            debug!(word, error = %e, "invalid glob pattern, keeping literal");
            return vec![word.to_string()];
        }
    };

    let matches: Vec<String> = paths
        .filter_map(|entry| entry.ok())
        .map(|path| {
            let shown = if relative {
                path.strip_prefix(cwd).map(Path::to_path_buf).unwrap_or(path)
            } else {
                path
            };
            shown.to_string_lossy().into_owned()
        })
        .collect();

    if matches.is_empty() {
        vec![word.to_string()]
    } else {
        matches
    }
}

/// Expand wildcards in every argument of `command` except the program name.
pub fn expand_command(command: &mut Command, cwd: &Path) {
    if !command.args.iter().skip(1).any(|a| has_wildcard(a)) {
        return;
    }
    let mut args = std::mem::take(&mut command.args).into_iter();
    let mut expanded: Vec<String> = args.next().into_iter().collect();
    for arg in args {
        if has_wildcard(&arg) {
            expanded.extend(expand_word(&arg, cwd));
        } else {
            expanded.push(arg);
        }
    }
    command.args = expanded;
}
