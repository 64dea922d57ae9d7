//! Implementation of the `envpin update` command.
//!
//! Re-fetches inputs ignoring their locked hashes, re-resolves the toolchain
//! they select and rewrites the lock file.

use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use envpin_lib::config::Settings;
use envpin_lib::update::{UpdateOptions, update_lock};

use super::{Global, runtime};
use crate::output::{format_duration, symbols, truncate_hash};

pub fn cmd_update(global: &Global, inputs: Vec<String>, dry_run: bool) -> Result<()> {
  let start = Instant::now();
  let path = global.descriptor_path()?;
  let settings = Settings::from_env();
  let options = UpdateOptions { inputs, dry_run };

  let rt = runtime()?;
  let result = rt
    .block_on(update_lock(&path, &settings, &options))
    .context("Failed to update the lock file")?;

  if dry_run {
    println!("{}", "Dry run - no changes written".if_supports_color(Stdout, |s| s.yellow()));
    println!();
  }

  for (name, (old, new)) in &result.updated {
    let prefix = if dry_run { "Would update" } else { "Updated" };
    println!(
      "  {} {}: {} {} {}",
      symbols::MODIFY.if_supports_color(Stdout, |s| s.yellow()),
      prefix,
      name.if_supports_color(Stdout, |s| s.cyan()),
      format!("{} ->", truncate_hash(old)).if_supports_color(Stdout, |s| s.dimmed()),
      truncate_hash(new).if_supports_color(Stdout, |s| s.green())
    );
  }
  for name in &result.added {
    let prefix = if dry_run { "Would add" } else { "Added" };
    println!(
      "  {} {}: {}",
      symbols::ADD.if_supports_color(Stdout, |s| s.green()),
      prefix,
      name.if_supports_color(Stdout, |s| s.cyan())
    );
  }
  for name in &result.removed {
    let prefix = if dry_run { "Would remove" } else { "Removed" };
    println!(
      "  {} {}: {}",
      symbols::REMOVE.if_supports_color(Stdout, |s| s.red()),
      prefix,
      name.if_supports_color(Stdout, |s| s.cyan())
    );
  }
  if let Some((old, new)) = &result.toolchain {
    println!(
      "  {} Toolchain: {} {} {}",
      symbols::MODIFY.if_supports_color(Stdout, |s| s.yellow()),
      old.as_deref().unwrap_or("none").if_supports_color(Stdout, |s| s.dimmed()),
      symbols::ARROW,
      new.as_deref().unwrap_or("none").if_supports_color(Stdout, |s| s.green())
    );
  }
  if !result.unchanged.is_empty() {
    println!(
      "  {} Unchanged: {}",
      symbols::INFO.if_supports_color(Stdout, |s| s.dimmed()),
      result.unchanged.join(", ").if_supports_color(Stdout, |s| s.dimmed())
    );
  }

  if !result.lock_changed {
    println!(
      "{} All inputs are up to date.",
      symbols::SUCCESS.if_supports_color(Stdout, |s| s.green())
    );
  } else if !dry_run {
    println!();
    println!(
      "{} Lock file updated: {}",
      symbols::SUCCESS.if_supports_color(Stdout, |s| s.green()),
      result.lock_path.display()
    );
    println!(
      "  {} Duration: {}",
      symbols::INFO.if_supports_color(Stdout, |s| s.dimmed()),
      format_duration(start.elapsed()).if_supports_color(Stdout, |s| s.dimmed())
    );
  }

  Ok(())
}
