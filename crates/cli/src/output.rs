//! Terminal output.
//!
//! Status lines go to stdout, errors to stderr. Colors are applied only when
//! the target stream supports them, so piped output stays plain.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

/// Hashes are shown by their first 12 characters.
pub fn truncate_hash(hash: &str) -> &str {
  hash.get(..12).unwrap_or(hash)
}

/// Elapsed time rounded to milliseconds (`1s 500ms`, `2m 3s`).
pub fn format_duration(duration: Duration) -> String {
  let rounded = if duration.as_secs() >= 60 {
    Duration::from_secs(duration.as_secs())
  } else {
    Duration::from_millis(duration.as_millis() as u64)
  };
  humantime::format_duration(rounded).to_string()
}

pub fn print_success(message: &str) {
  println!("{} {message}", symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()));
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!("{} {message}", symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()));
}

/// An indented `label: value` line.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
