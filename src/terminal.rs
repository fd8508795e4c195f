//! Terminal mode handling for the interactive session.
//!
//! The attributes of standard input are captured once when the session starts.
//! Raw mode is entered through [`Terminal::raw_mode`], which returns a guard that
//! puts the captured attributes back when dropped, including during unwinding.

use crate::error::Result;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use std::io;
use std::os::fd::AsFd;
use tracing::warn;

/// Terminal attributes of standard input as they were at session start.
pub struct Terminal {
    original: Termios,
}

impl Terminal {
    /// Capture the current attributes of standard input.
    ///
    /// Fails when standard input is not a terminal.
    pub fn capture() -> Result<Self> {
        let original = termios::tcgetattr(io::stdin().as_fd())?;
        Ok(Self { original })
    }

    /// Switch to character-at-a-time input without echo.
    ///
    /// Signal generation stays enabled so Ctrl-C still raises `SIGINT`.
    pub fn raw_mode(&self) -> Result<RawModeGuard<'_>> {
        enter_raw(io::stdin(), &self.original)?;
        Ok(RawModeGuard {
            original: &self.original,
        })
    }
}

/// Apply raw attributes derived from `original` to `fd`.
///
/// Input already queued on the terminal is kept, so keys typed while a
/// foreground command ran are read at the next prompt.
fn enter_raw(fd: impl AsFd, original: &Termios) -> Result<()> {
    let mut raw = original.clone();
    raw.local_flags.remove(LocalFlags::ECHO | LocalFlags::ICANON);
    raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::tcsetattr(fd.as_fd(), SetArg::TCSANOW, &raw)?;
    Ok(())
}

/// Restores the captured terminal attributes when dropped.
#[must_use = "raw mode ends as soon as the guard is dropped"]
pub struct RawModeGuard<'a> {
    original: &'a Termios,
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSADRAIN, self.original) {
            warn!(error = %e, "failed to restore terminal attributes");
        }
    }
}

extern "C" fn on_interrupt(_signal: nix::libc::c_int) {}

/// Keep the shell alive on Ctrl-C.
///
/// A handler that does nothing replaces the default action. Children get the
/// default disposition back when they exec, so a foreground program is still
/// interrupted. Without `SA_RESTART` a blocked terminal read
/// returns `EINTR`, which the line editor turns into a cancelled line.
pub fn install_interrupt_handler() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler has an empty body, so it is async-signal-safe.
    unsafe { sigaction(Signal::SIGINT, &action) }?;
    Ok(())
}
