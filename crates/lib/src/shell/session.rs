//! Running a process inside a session environment.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, info};

use super::SessionError;
use super::env::ShellEnv;

/// Fallback interactive shell when the session has no `SHELL`.
const DEFAULT_SHELL: &str = "/bin/sh";

/// A development shell session: an environment and a working directory.
#[derive(Debug, Clone)]
pub struct Session<'a> {
  env: &'a ShellEnv,
  cwd: &'a Path,
}

impl<'a> Session<'a> {
  pub fn new(env: &'a ShellEnv, cwd: &'a Path) -> Self {
    Self { env, cwd }
  }

  /// The program and arguments that `run` would execute.
  pub fn command_line(&self, command: &[String]) -> Result<(PathBuf, Vec<String>), SessionError> {
    match command.split_first() {
      None => {
        let shell = self.env.get("SHELL").filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SHELL);
        Ok((PathBuf::from(shell), Vec::new()))
      }
      Some((program, args)) => {
        let resolved = self
          .env
          .which(program)
          .ok_or_else(|| SessionError::CommandNotFound { name: program.clone() })?;
        Ok((resolved, args.to_vec()))
      }
    }
  }

  /// Runs the interactive shell (empty `command`) or the given command with
  /// exactly the session environment and waits for it.
  ///
  /// Returns the child's exit code.
  pub fn run(&self, command: &[String]) -> Result<i32, SessionError> {
    let (program, args) = self.command_line(command)?;
    if command.is_empty() {
      info!(shell = %program.display(), "entering development shell");
    } else {
      debug!(program = %program.display(), ?args, "running command in session");
    }

    let status = Command::new(&program)
      .args(&args)
      .current_dir(self.cwd)
      .env_clear()
      .envs(self.env.vars())
      .status()
      .map_err(|source| SessionError::Spawn {
        program: program.clone(),
        source,
      })?;

    Ok(exit_code(status))
  }
}

/// Exit code of a finished child; signals map to `128 + signal` as shells
/// report them.
pub fn exit_code(status: ExitStatus) -> i32 {
  if let Some(code) = status.code() {
    return code;
  }
  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
      return 128 + signal;
    }
  }
  1
}
