//! Implementation of the `envpin build` command.

use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use envpin_lib::package::{BuildOptions, realize};

use super::{Global, evaluate_descriptor, runtime};
use crate::output::{format_duration, print_stat, print_success, symbols, truncate_hash};

/// Builds the package and prints where it landed.
pub fn cmd_build(global: &Global, no_link: bool) -> Result<()> {
  let start = Instant::now();
  let rt = runtime()?;
  let eval = evaluate_descriptor(global, &rt)?;

  let options = BuildOptions { link: !no_link };
  let output = rt.block_on(realize(&eval, &options)).context("Build failed")?;

  let what = if output.cached { "Up to date" } else { "Built" };
  print_success(&format!("{what}: {}", eval.outputs.package.name));
  print_stat("Output", &output.out_dir.display().to_string());
  print_stat("Program", &output.program.display().to_string());
  print_stat("Key", truncate_hash(&output.key.0));
  if let Some(link) = &output.link {
    println!(
      "  {} {} {} {}",
      symbols::INFO.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      link.display(),
      symbols::ARROW,
      output.out_dir.display()
    );
  }
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
