//! Background jobs.
//!
//! Children started by a background pipeline are parked here instead of being
//! waited for. The interpreter polls the table before each prompt; finished
//! children are reaped at that point so they don't linger as zombies.

use crate::command::ExitCode;
use crate::pipeline::exit_code;
use std::process::Child;
use tracing::{info, warn};

struct Job {
    child: Child,
    command: String,
}

/// A background child that has exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub pid: u32,
    pub status: ExitCode,
    pub command: String,
}

/// Background children that have not been reaped yet.
#[derive(Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a running background child. Returns its pid.
    pub fn add(&mut self, child: Child, command: impl Into<String>) -> u32 {
        let pid = child.id();
        self.jobs.push(Job {
            child,
            command: command.into(),
        });
        pid
    }

    /// Number of children still tracked.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Pids of tracked children, in submission order.
    pub fn pids(&self) -> Vec<u32> {
        self.jobs.iter().map(|job| job.child.id()).collect()
    }

    /// Collect every child that has exited, without blocking.
    pub fn reap(&mut self) -> Vec<Finished> {
        let mut finished = Vec::new();
        self.jobs.retain_mut(|job| match job.child.try_wait() {
            Ok(Some(status)) => {
                let pid = job.child.id();
                let status = exit_code(status);
                info!(pid, status, command = %job.command, "background job finished");
                finished.push(Finished {
                    pid,
                    status,
                    command: job.command.clone(),
                });
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid = job.child.id(), error = %e, "cannot poll background job, dropping it");
                false
            }
        });
        finished
    }
}
