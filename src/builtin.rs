use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "history".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        T::execute(*self, stdout, env)
    }
}

/// Stands in for a builtin whose arguments did not parse (or that was asked for `--help`).
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        if self.is_error {
            bail!("{}", self.output.trim_end());
        }
        stdout.write_all(self.output.as_bytes())?;
        Ok(0)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        Some(match T::from_args(&[name], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let Some(target) = self.target.filter(|t| !t.is_empty()) else {
            bail!("cd: expected argument");
        };

        let new_dir = env.resolve(&target);
        let canonical = fs::canonicalize(&new_dir).with_context(|| format!("cd: {target}"))?;
        env::set_current_dir(&canonical).with_context(|| format!("cd: {target}"))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the commands recorded in this session, oldest first.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for (index, line) in env.history.iter() {
            writeln!(stdout, "{index} {line}")?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional)]
    /// exit status, 0 when omitted.
    pub code: Option<i32>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(self.code.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env as stdenv;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Restores the process working directory when dropped.
    struct CwdRestore(PathBuf);

    impl Drop for CwdRestore {
        fn drop(&mut self) {
            let _ = stdenv::set_current_dir(&self.0);
        }
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let _restore = CwdRestore(stdenv::current_dir().unwrap());
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();

        let mut env = Environment::new();
        let cmd = Cd {
            target: Some(canonical_temp.to_string_lossy().to_string()),
        };
        let res = cmd.execute(&mut Vec::new(), &mut env);

        assert_eq!(res.unwrap(), 0);
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);
    }

    #[test]
    fn test_cd_relative_to_environment_dir() {
        let _lock = lock_current_dir();
        let _restore = CwdRestore(stdenv::current_dir().unwrap());
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let mut env = Environment::at(temp.path());
        let cmd = Cd {
            target: Some("sub".to_string()),
        };
        cmd.execute(&mut Vec::new(), &mut env).unwrap();

        assert_eq!(env.current_dir, fs::canonicalize(temp.path().join("sub")).unwrap());
    }

    #[test]
    fn test_cd_without_argument_errors() {
        let mut env = Environment::at("/");
        let err = Cd { target: None }
            .execute(&mut Vec::new(), &mut env)
            .unwrap_err();
        assert_eq!(err.to_string(), "cd: expected argument");
        assert_eq!(env.current_dir, PathBuf::from("/"));
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();

        let mut env = Environment::at(temp.path());
        let cmd = Cd {
            target: Some("does-not-exist".to_string()),
        };
        let res = cmd.execute(&mut Vec::new(), &mut env);

        assert!(res.is_err());
        assert!(format!("{:#}", res.unwrap_err()).starts_with("cd: does-not-exist"));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, temp.path());
    }

    #[test]
    fn test_history_lists_logical_numbers() {
        let mut env = Environment::at("/");
        env.history = crate::history::HistoryStore::with_capacity(2);
        for line in ["ls", "pwd", "date"] {
            env.history.record(line);
        }

        let mut out = Vec::new();
        History {}.execute(&mut out, &mut env).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2 pwd\n3 date\n");
    }

    #[test]
    fn test_exit_sets_flag_and_status() {
        let mut env = Environment::at("/");
        assert_eq!(Exit { code: Some(3) }.execute(&mut Vec::new(), &mut env).unwrap(), 3);
        assert!(env.should_exit);
    }

    #[test]
    fn test_factory_matches_by_name_and_reports_bad_args() {
        let factory = Factory::<Cd>::default();
        assert!(factory.try_create("ls", &[]).is_none());

        let mut env = Environment::at("/");
        let cmd = factory.try_create("cd", &["a", "b"]).expect("cd is known");
        assert!(cmd.execute(&mut Vec::new(), &mut env).is_err());

        let help = factory.try_create("cd", &["--help"]).expect("cd is known");
        let mut out = Vec::new();
        assert_eq!(help.execute(&mut out, &mut env).unwrap(), 0);
        assert!(String::from_utf8(out).unwrap().contains("Usage: cd"));
    }
}
