use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::config::ShellConfig;
use crate::editor::{LineEditor, ReadOutcome};
use crate::env::Environment;
use crate::error::ShellError;
use crate::expand;
use crate::history::{HistoryStore, Recall};
use crate::jobs::JobTable;
use crate::lexer;
use crate::parser::{self, Command, LogicalChain, Pipeline, RedirectionSpec};
use crate::pipeline;
use crate::terminal::{self, Terminal};
use anyhow::Context;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate, i.e. the builtins.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell: reads lines, runs pipelines of external programs and a
/// handful of builtins.
///
/// One line goes through these steps:
/// 1. a leading `!n` is replaced by history entry `n`;
/// 2. the line is recorded in history (unless it invokes `history`);
/// 3. it is split into `;`-separated statements;
/// 4. each statement is tokenized and parsed into a chain of pipelines joined by
///    `&&` / `||`, which are run left to right with short-circuiting.
///
/// Example
/// ```
/// use utsh::Interpreter;
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute_line("false && echo unreachable"), 1);
/// assert_eq!(sh.execute_line("false || true"), 0);
/// ```
pub struct Interpreter {
    env: Environment,
    config: ShellConfig,
    jobs: JobTable,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of builtin factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        let config = ShellConfig::default();
        let mut env = Environment::new();
        env.history = HistoryStore::with_capacity(config.history_capacity);
        Self {
            env,
            config,
            jobs: JobTable::new(),
            commands,
        }
    }

    /// Create an interpreter with the default builtins and the given settings.
    pub fn with_config(config: ShellConfig) -> Self {
        let mut sh = Self::default();
        sh.env.history = HistoryStore::with_capacity(config.history_capacity);
        sh.config = config;
        sh
    }

    /// Run commands in `dir` instead of the process working directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.env.current_dir = dir.into();
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Background children that have not been reaped yet.
    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Builtins run in-process; anything else is launched as a program.
    pub fn run(&mut self, name: &str, args: &[&str]) -> ExitCode {
        let mut argv = vec![name.to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        self.execute_pipeline(Pipeline {
            commands: vec![Command {
                args: argv,
                redirection: RedirectionSpec::default(),
            }],
            background: false,
        })
    }

    /// Process one input line and return the status of the last command run.
    pub fn execute_line(&mut self, line: &str) -> ExitCode {
        let line = match self.env.history.resolve_recall(line) {
            Recall::NotRequested => line.to_string(),
            Recall::Found(text) => {
                println!("{text}");
                text
            }
            Recall::Missing(n) => {
                debug!(n, "history recall miss");
                eprintln!("No such command in history.");
                return 1;
            }
        };

        if !invokes_history(&line) {
            self.env.history.record(&line);
        }

        let mut status = 0;
        for statement in lexer::split_statements(&line) {
            status = self.execute_statement(statement);
            if self.env.should_exit {
                break;
            }
        }
        status
    }

    fn execute_statement(&mut self, statement: &str) -> ExitCode {
        let tokens = lexer::split_into_tokens(statement);
        if tokens.is_empty() {
            return 0;
        }
        debug!(?tokens, "statement");
        match parser::parse_chain(tokens) {
            Ok(chain) => self.execute_chain(chain),
            Err(e) => report(&e),
        }
    }

    /// Run the pipelines of a chain until a connective short-circuits.
    fn execute_chain(&mut self, chain: LogicalChain) -> ExitCode {
        let mut status = 0;
        for (pipeline, connective) in chain.links {
            status = self.execute_pipeline(pipeline);
            if self.env.should_exit || !connective.proceeds_after(status) {
                break;
            }
        }
        status
    }

    fn execute_pipeline(&mut self, mut pipeline: Pipeline) -> ExitCode {
        for command in &mut pipeline.commands {
            expand::expand_command(command, &self.env.current_dir);
        }

        if let [command] = pipeline.commands.as_slice() {
            if let Some(builtin) = self.find_builtin(command) {
                return self
                    .run_builtin(builtin, &command.redirection)
                    .unwrap_or_else(|e| report(&e));
            }
        }

        pipeline::run(&pipeline, &self.env.current_dir, &mut self.jobs)
            .unwrap_or_else(|e| report(&e))
    }

    fn find_builtin(&self, command: &Command) -> Option<Box<dyn ExecutableCommand>> {
        let args: Vec<&str> = command.args[1..].iter().map(String::as_str).collect();
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(command.program(), &args))
    }

    fn run_builtin(
        &mut self,
        builtin: Box<dyn ExecutableCommand>,
        redirection: &RedirectionSpec,
    ) -> Result<ExitCode, ShellError> {
        let result = match &redirection.output {
            Some(path) => {
                let mut file =
                    pipeline::open_output(path, redirection.append, &self.env.current_dir)?;
                builtin.execute(&mut file, &mut self.env)
            }
            None => {
                let mut stdout = io::stdout();
                let result = builtin.execute(&mut stdout, &mut self.env);
                flush_output(&mut stdout)?;
                result
            }
        };
        result.map_err(|e| ShellError::Builtin(format!("{e:#}")))
    }

    /// Print and forget background children that have exited since the last call.
    pub fn report_finished_jobs(&mut self) {
        for job in self.jobs.reap() {
            println!("[{}] Done ({}) {}", job.pid, job.status, job.command);
        }
    }

    /// Process lines from a non-interactive source until it ends or `exit` runs.
    pub fn run_script<R: BufRead>(&mut self, reader: R) -> anyhow::Result<ExitCode> {
        for line in reader.lines() {
            let line = line.context("failed to read input")?;
            self.report_finished_jobs();
            let status = self.execute_line(&line);
            if self.env.should_exit {
                return Ok(status);
            }
        }
        Ok(0)
    }

    /// Interactive Read-Eval-Print Loop.
    ///
    /// Uses the raw-mode line editor when standard input is a terminal and falls
    /// back to [`Interpreter::run_script`] otherwise. Returns the status the
    /// shell should exit with: 0 at end of input, or the `exit` argument.
    pub fn repl(&mut self) -> anyhow::Result<ExitCode> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return self.run_script(stdin.lock());
        }

        let terminal = Terminal::capture().context("cannot initialise the terminal")?;
        if let Err(e) = terminal::install_interrupt_handler() {
            warn!(error = %e, "cannot install SIGINT handler");
        }

        let mut input = stdin.lock();
        let mut stdout = io::stdout();
        loop {
            self.report_finished_jobs();
            write!(stdout, "{}", self.config.prompt)?;
            stdout.flush()?;

            let outcome = {
                let _raw = terminal.raw_mode().context("cannot enter raw mode")?;
                LineEditor::new(&self.config.prompt, &self.env.current_dir)
                    .completion_limit(self.config.completion_limit)
                    .read_line(&mut input, &mut stdout)?
            };

            match outcome {
                ReadOutcome::Line(line) => {
                    let status = self.execute_line(&line);
                    if self.env.should_exit {
                        return Ok(status);
                    }
                }
                ReadOutcome::Interrupted => continue,
                ReadOutcome::Eof => return Ok(0),
            }
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of builtins:
    /// `cd`, `history` and `exit`.
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<History>::default()),
            Box::new(Factory::<Exit>::default()),
        ])
    }
}

fn flush_output(out: &mut dyn Write) -> Result<(), ShellError> {
    out.flush().map_err(|source| ShellError::Io {
        target: "stdout".to_string(),
        source,
    })
}

/// True when any statement of `line` runs the `history` builtin.
fn invokes_history(line: &str) -> bool {
    lexer::split_statements(line).into_iter().any(|statement| {
        lexer::split_into_tokens(statement).first().map(String::as_str) == Some("history")
    })
}

fn report(err: &ShellError) -> ExitCode {
    eprintln!("utsh: {err}");
    err.exit_code()
}
