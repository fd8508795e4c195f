//! Error types for the shell.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias for shell operations.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Everything that can go wrong while turning a line into running processes.
///
/// None of these end the session; the interpreter reports them and moves on to
/// the next statement. The only fatal condition is failing to set up the
/// terminal, which surfaces as [`ShellError::Terminal`] from startup code.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Malformed syntax: dangling operator, empty pipeline segment, and so on.
    #[error("syntax error: {0}")]
    Parse(String),

    /// Opening a redirection target or creating a pipe failed.
    #[error("{target}: {source}")]
    Io {
        /// The file being opened, or `pipe`.
        target: String,
        #[source]
        source: io::Error,
    },

    /// The OS refused to create a process.
    #[error("cannot create process: {0}")]
    Process(#[source] io::Error),

    /// The program could not be found or executed.
    #[error("{program}: {}", exec_reason(.source))]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A builtin failed (for example `cd` into a missing directory).
    #[error("{0}")]
    Builtin(String),

    /// Reading or changing terminal attributes failed.
    #[error("terminal: {0}")]
    Terminal(#[from] nix::Error),
}

impl ShellError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        ShellError::Parse(msg.into())
    }

    pub(crate) fn io(target: &Path, source: io::Error) -> Self {
        ShellError::Io {
            target: target.display().to_string(),
            source,
        }
    }

    /// Exit status a failed command reports in place of a real child status.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::Exec { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
            ShellError::Exec { .. } => 126,
            ShellError::Parse(_) => 2,
            _ => 1,
        }
    }
}

fn exec_reason(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "command not found".to_string(),
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_not_found_maps_to_127() {
        let err = ShellError::Exec {
            program: "nope".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), 127);
        assert_eq!(err.to_string(), "nope: command not found");
    }

    #[test]
    fn test_io_error_names_the_path() {
        let err = ShellError::io(
            Path::new("missing.txt"),
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(err.to_string(), "missing.txt: No such file or directory");
        assert_eq!(err.exit_code(), 1);
    }
}
