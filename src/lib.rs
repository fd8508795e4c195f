//! A small interactive Unix shell.
//!
//! The crate splits the shell into the pieces one input line travels through:
//! the [`lexer`] turns text into tokens, the [`parser`] groups them into
//! pipelines joined by `&&` / `||` and resolves `<`, `>` and `>>`, [`expand`]
//! applies filename globbing, and [`pipeline`] wires the stages together with
//! pipes and launches them. Interactive input is read through the raw-mode
//! [`editor`], which completes names from the working directory with the
//! [`completer`]; past lines are kept in the bounded [`history`] store.
//!
//! The main entry point is [`Interpreter`], which ties everything together and
//! also dispatches the builtins `cd`, `history` and `exit`.

mod builtin;
pub mod command;
pub mod completer;
pub mod config;
pub mod editor;
pub mod env;
pub mod error;
pub mod expand;
pub mod history;
mod interpreter;
pub mod jobs;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod terminal;

/// Just a convenient re-export of the command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

pub use config::ShellConfig;
pub use error::ShellError;
