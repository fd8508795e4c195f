//! Launching pipelines as child processes.
//!
//! Each stage of a [`Pipeline`] becomes one child. Adjacent stages are connected
//! by an OS pipe whose two ends are [`OwnedFd`]s: the write end moves into the
//! left stage's stdout, the read end into the right stage's stdin. Whatever the
//! parent still holds is closed as soon as the stage is spawned, because the
//! `std::process::Command` that owns it goes out of scope. Pipes are created
//! close-on-exec, so no child inherits an end it was not handed explicitly.
//! A reader therefore sees EOF as soon as its writer exits.
//!
//! File redirections are applied on top of the pipe wiring and win over it: an
//! explicit `>` on a stage that also feeds a pipe drops the pipe's write end.

use crate::command::ExitCode;
use crate::error::{Result, ShellError};
use crate::jobs::JobTable;
use crate::parser::{Command, Pipeline};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::process::{self, Child, ExitStatus, Stdio};
use tracing::debug;

/// Outcome of launching one stage.
enum Stage {
    Running(Child),
    /// The stage could not be started; the error has been reported.
    Failed(ExitCode),
}

/// Run `pipeline` with `cwd` as the working directory of every stage.
///
/// Foreground pipelines are waited for and report the exit status of their last
/// stage. Background pipelines are handed to `jobs` after their pids are printed,
/// and report success immediately.
///
/// A stage whose program cannot be executed or whose redirection target cannot
/// be opened is reported on stderr and does not stop the other stages. Failure
/// to create a pipe or a process aborts the pipeline and is returned as an error.
pub fn run(pipeline: &Pipeline, cwd: &Path, jobs: &mut JobTable) -> Result<ExitCode> {
    let count = pipeline.commands.len();
    let mut stages = Vec::with_capacity(count);
    let mut upstream: Option<OwnedFd> = None;
    let mut abort = None;

    for (i, command) in pipeline.commands.iter().enumerate() {
        let stdin_pipe = upstream.take();
        let stdout_pipe = if i + 1 < count {
            match open_pipe() {
                Ok((reader, writer)) => {
                    upstream = Some(reader);
                    Some(writer)
                }
                Err(e) => {
                    abort = Some(e);
                    break;
                }
            }
        } else {
            None
        };

        match spawn_stage(command, stdin_pipe, stdout_pipe, cwd) {
            Ok(child) => {
                debug!(pid = child.id(), program = command.program(), stage = i, "spawned");
                stages.push(Stage::Running(child));
            }
            Err(e @ ShellError::Process(_)) => {
                abort = Some(e);
                break;
            }
            Err(e) => {
                eprintln!("utsh: {e}");
                stages.push(Stage::Failed(e.exit_code()));
            }
        }
    }
    drop(upstream);

    if pipeline.background {
        let text = describe(pipeline);
        for stage in stages {
            if let Stage::Running(child) = stage {
                let pid = jobs.add(child, text.clone());
                println!("[Background pid {pid}]");
            }
        }
        return match abort {
            Some(e) => Err(e),
            None => Ok(0),
        };
    }

    let mut status = 0;
    for stage in stages {
        status = match stage {
            Stage::Running(mut child) => match child.wait() {
                Ok(exit) => exit_code(exit),
                Err(e) => {
                    debug!(pid = child.id(), error = %e, "wait failed");
                    1
                }
            },
            Stage::Failed(code) => code,
        };
    }

    match abort {
        Some(e) => Err(e),
        None => Ok(status),
    }
}

fn open_pipe() -> Result<(OwnedFd, OwnedFd)> {
    pipe2(OFlag::O_CLOEXEC).map_err(|errno| ShellError::Io {
        target: "pipe".to_string(),
        source: io::Error::from(errno),
    })
}

fn spawn_stage(
    command: &Command,
    stdin_pipe: Option<OwnedFd>,
    stdout_pipe: Option<OwnedFd>,
    cwd: &Path,
) -> Result<Child> {
    let stdin = match &command.redirection.input {
        Some(path) => Stdio::from(open_input(path, cwd)?),
        None => stdin_pipe.map_or_else(Stdio::inherit, Stdio::from),
    };
    let stdout = match &command.redirection.output {
        Some(path) => Stdio::from(open_output(path, command.redirection.append, cwd)?),
        None => stdout_pipe.map_or_else(Stdio::inherit, Stdio::from),
    };

    let mut process = process::Command::new(command.program());
    process
        .args(&command.args[1..])
        .current_dir(cwd)
        .stdin(stdin)
        .stdout(stdout);
    process
        .spawn()
        .map_err(|source| spawn_error(command.program(), source))
}

fn spawn_error(program: &str, source: io::Error) -> ShellError {
    let cannot_exec = matches!(
        source.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || source.raw_os_error() == Some(Errno::ENOEXEC as i32);
    if cannot_exec {
        ShellError::Exec {
            program: program.to_string(),
            source,
        }
    } else {
        ShellError::Process(source)
    }
}

/// Open a `<` target read-only.
pub fn open_input(path: &Path, cwd: &Path) -> Result<File> {
    File::open(cwd.join(path)).map_err(|e| ShellError::io(path, e))
}

/// Open a `>` / `>>` target, creating it with mode 0644 if needed.
pub fn open_output(path: &Path, append: bool, cwd: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .mode(0o644)
        .open(cwd.join(path))
        .map_err(|e| ShellError::io(path, e))
}

/// Shell-style exit code: the process's own code, or `128 + signal` if it was killed.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

fn terminated_by_signal(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
        128 + signal
    } else if status.core_dumped() {
        255
    } else {
        -1
    }
}

/// Human-readable form of a pipeline, used when reporting background jobs.
pub fn describe(pipeline: &Pipeline) -> String {
    pipeline
        .commands
        .iter()
        .map(|c| c.args.join(" "))
        .collect::<Vec<_>>()
        .join(" | ")
}
