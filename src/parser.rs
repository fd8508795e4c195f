//! Turning word tokens into executable structure.
//!
//! A statement is parsed in three layers, outermost first:
//!
//! 1. [`parse_chain`] splits on `&&` / `||` into a [`LogicalChain`].
//! 2. [`parse_pipeline`] strips a trailing `&` and splits on `|` into a [`Pipeline`].
//! 3. [`resolve_redirections`] pulls `<`, `>` and `>>` out of each pipeline segment.
//!
//! Parsing never touches the filesystem. Redirection targets are only opened when
//! the pipeline is launched.

use crate::error::{Result, ShellError};
use std::fmt;
use std::path::PathBuf;

const PIPE: &str = "|";
const BACKGROUND: &str = "&";
const AND: &str = "&&";
const OR: &str = "||";

/// Kind of redirection
///
/// Defines the specific operation mode for an I/O redirection (`<`, `>`, `>>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): reads standard input from a file.
    Input,
    /// Output redirection (`>`): writes standard output to a file, truncating it first.
    Output,
    /// Output redirection with append (`>>`): writes standard output to the end of a file.
    Append,
}

impl RedirectKind {
    /// Recognise a redirection operator token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" => Some(RedirectKind::Input),
            ">" => Some(RedirectKind::Output),
            ">>" => Some(RedirectKind::Append),
            _ => None,
        }
    }
}

/// File redirections attached to one command.
///
/// At most one input and one output target are active. When an operator appears
/// more than once, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Only meaningful when `output` is set: open with append instead of truncate.
    pub append: bool,
}

impl RedirectionSpec {
    /// True when no redirection is requested.
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }

    fn apply(&mut self, kind: RedirectKind, target: String) {
        match kind {
            RedirectKind::Input => self.input = Some(PathBuf::from(target)),
            RedirectKind::Output | RedirectKind::Append => {
                self.output = Some(PathBuf::from(target));
                self.append = kind == RedirectKind::Append;
            }
        }
    }
}

/// A single program invocation: `args[0]` is the program, the rest its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub args: Vec<String>,
    pub redirection: RedirectionSpec,
}

impl Command {
    /// Program name, i.e. `args[0]`.
    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }
}

/// Commands joined by `|`, optionally sent to the background with a trailing `&`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub background: bool,
}

/// How a pipeline is joined to the one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// `&&`: run the next pipeline only if this one succeeded.
    And,
    /// `||`: run the next pipeline only if this one failed.
    Or,
    /// Last pipeline of the chain.
    End,
}

impl Connective {
    /// Decide whether evaluation continues after a pipeline that exited with `status`.
    pub fn proceeds_after(self, status: i32) -> bool {
        match self {
            Connective::And => status == 0,
            Connective::Or => status != 0,
            Connective::End => false,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connective::And => f.write_str(AND),
            Connective::Or => f.write_str(OR),
            Connective::End => Ok(()),
        }
    }
}

/// Pipelines joined by short-circuiting `&&` / `||`.
///
/// Every link carries the connective that follows its pipeline; the last link
/// always carries [`Connective::End`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalChain {
    pub links: Vec<(Pipeline, Connective)>,
}

fn is_operator(token: &str) -> bool {
    matches!(token, PIPE | BACKGROUND | AND | OR) || RedirectKind::from_token(token).is_some()
}

/// Extract `<`, `>` and `>>` operators and their targets from a command segment.
///
/// Operators may appear anywhere in the segment. The remaining words keep their
/// relative order. Fails when an operator is not followed by a file name.
pub fn resolve_redirections(tokens: Vec<String>) -> Result<(Vec<String>, RedirectionSpec)> {
    let mut spec = RedirectionSpec::default();
    let mut args = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        let Some(kind) = RedirectKind::from_token(&token) else {
            args.push(token);
            continue;
        };
        match tokens.next() {
            Some(target) if !is_operator(&target) => spec.apply(kind, target),
            _ => return Err(ShellError::parse("missing redirection target")),
        }
    }

    Ok((args, spec))
}

/// Parse the tokens of one pipeline.
///
/// A trailing `&` marks the whole pipeline as background. Empty segments around
/// `|` and commands left with no words after redirection removal are errors.
pub fn parse_pipeline(mut tokens: Vec<String>) -> Result<Pipeline> {
    let background = tokens.last().is_some_and(|t| t == BACKGROUND);
    if background {
        tokens.pop();
    }
    if tokens.is_empty() {
        return Err(ShellError::parse("missing command"));
    }
    if tokens.iter().any(|t| t == BACKGROUND) {
        return Err(ShellError::parse("unexpected `&`"));
    }

    let mut commands = Vec::new();
    for segment in tokens.split(|t| t == PIPE) {
        if segment.is_empty() {
            return Err(ShellError::parse("empty pipeline segment near `|`"));
        }
        let (args, redirection) = resolve_redirections(segment.to_vec())?;
        if args.is_empty() {
            return Err(ShellError::parse("missing command"));
        }
        commands.push(Command { args, redirection });
    }

    Ok(Pipeline {
        commands,
        background,
    })
}

/// Parse a whole statement into a chain of pipelines.
pub fn parse_chain(tokens: Vec<String>) -> Result<LogicalChain> {
    let mut links = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        let connective = match token.as_str() {
            AND => Connective::And,
            OR => Connective::Or,
            _ => {
                current.push(token);
                continue;
            }
        };
        if current.is_empty() {
            return Err(ShellError::parse(format!("missing command before `{connective}`")));
        }
        links.push((parse_pipeline(std::mem::take(&mut current))?, connective));
    }

    if let (true, Some((_, connective))) = (current.is_empty(), links.last()) {
        return Err(ShellError::parse(format!("missing command after `{connective}`")));
    }
    links.push((parse_pipeline(current)?, Connective::End));
    Ok(LogicalChain { links })
}
