//! Implementation of the `envpin run` command.

use anyhow::{Context, Result};

use envpin_lib::package::{BuildOptions, run};

use super::{Global, evaluate_descriptor, runtime};

/// Builds the package if needed and runs the app; returns its exit code.
pub fn cmd_run(global: &Global, args: Vec<String>) -> Result<i32> {
  let rt = runtime()?;
  let eval = evaluate_descriptor(global, &rt)?;

  // Running does not touch the `result` link.
  let options = BuildOptions { link: false };
  rt.block_on(run(&eval, &args, &options)).context("Run failed")
}
