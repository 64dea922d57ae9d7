//! Development shell sessions.
//!
//! - [`env`] - computing the session environment
//! - [`script`] - rendering it as shell `export` statements
//! - [`session`] - running an interactive shell or command inside it
//!
//! The session environment is handed to a child process; the invoking
//! process environment is never modified.

pub mod env;
pub mod script;
pub mod session;

use std::path::PathBuf;

use thiserror::Error;

pub use env::{KEEP_VARS, ShellEnv, ShellEnvBuilder, ShellOptions, host_vars, is_var_name};
pub use script::{Shell, render_script};
pub use session::Session;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("cannot put '{entry}' into {var}: {message}")]
  InvalidPath {
    var: String,
    entry: String,
    message: String,
  },

  #[error("'{name}' is not a valid environment variable name")]
  InvalidVarName { name: String },

  #[error("command '{name}' not found in the shell's PATH")]
  CommandNotFound { name: String },

  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unknown shell '{0}' (expected sh, bash, zsh or fish)")]
  UnknownShell(String),
}
