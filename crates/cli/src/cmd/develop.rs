//! Implementation of the `envpin develop` command.
//!
//! Spawns an interactive shell (or `-c CMD ARGS...`) with exactly the dev
//! shell environment. The environment of `envpin` itself is not modified.

use anyhow::{Context, Result};
use tracing::debug;

use envpin_lib::shell::{Session, ShellOptions, host_vars};

use super::{Global, evaluate_descriptor, runtime};

pub fn cmd_develop(global: &Global, impure: bool, keep: Vec<String>, command: Vec<String>) -> Result<i32> {
  let rt = runtime()?;
  let eval = evaluate_descriptor(global, &rt)?;
  let toolchain_bin = rt
    .block_on(eval.toolchain_bin())
    .context("Failed to provide the toolchain")?;

  let options = ShellOptions { pure: !impure, keep };
  let env = eval
    .shell_env(toolchain_bin.as_deref(), &options, host_vars())
    .context("Failed to build the shell environment")?;
  debug!(vars = env.vars().len(), "shell environment ready");

  let cwd = std::env::current_dir().context("Failed to read the current directory")?;
  let code = Session::new(&env, &cwd).run(&command).context("Shell session failed")?;
  Ok(code)
}
