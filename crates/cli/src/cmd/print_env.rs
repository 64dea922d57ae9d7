//! Implementation of the `envpin print-env` command.

use anyhow::{Context, Result};

use envpin_lib::shell::{Shell, ShellOptions, host_vars, render_script};

use super::{Global, evaluate_descriptor, runtime};

/// Prints the dev shell environment for `eval "$(envpin print-env)"`.
pub fn cmd_print_env(global: &Global, shell: Option<&str>, impure: bool) -> Result<()> {
  let shell = match shell {
    Some(name) => name.parse::<Shell>()?,
    None => Shell::detect(std::env::var("SHELL").ok().as_deref()),
  };

  let rt = runtime()?;
  let eval = evaluate_descriptor(global, &rt)?;
  let toolchain_bin = rt
    .block_on(eval.toolchain_bin())
    .context("Failed to provide the toolchain")?;

  let options = ShellOptions {
    pure: !impure,
    ..Default::default()
  };
  let env = eval
    .shell_env(toolchain_bin.as_deref(), &options, host_vars())
    .context("Failed to build the shell environment")?;

  print!("{}", render_script(&env, shell));
  Ok(())
}
