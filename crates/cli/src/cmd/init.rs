//! Implementation of the `envpin init` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use envpin_lib::init::init_descriptor;

use crate::output::symbols;

/// Writes a template `envpin.lua` (plus LuaLS support files) into `dir`.
pub fn cmd_init(dir: &Path) -> Result<()> {
  let result = init_descriptor(dir).context("Failed to initialize descriptor")?;

  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stdout, |s| s.green()),
    format!("Initialized envpin descriptor for {}", result.name).if_supports_color(Stdout, |s| s.green())
  );
  println!();
  println!("  {} Descriptor:   {}", symbols::INFO.if_supports_color(Stdout, |s| s.cyan()), result.descriptor.display());
  if let Some(luarc) = &result.luarc_json {
    println!("  {} LuaLS config: {}", symbols::INFO.if_supports_color(Stdout, |s| s.cyan()), luarc.display());
  }
  println!();
  println!("{}", "Next steps:".if_supports_color(Stdout, |s| s.bold()));
  println!(
    "  1. Declare tools and libraries in {}",
    result.descriptor.display().to_string().if_supports_color(Stdout, |s| s.cyan())
  );
  println!("  2. Run: {}", "envpin develop".if_supports_color(Stdout, |s| s.cyan()));

  Ok(())
}
