//! Implementation of the `envpin show` command.
//!
//! Prints the canonical package and the outputs derived from it: the app
//! and the dev shell both name the package by hash.

use std::time::{Duration, UNIX_EPOCH};

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use envpin_lib::eval::Evaluation;

use super::{Global, evaluate_descriptor, runtime};
use crate::output::{print_json, print_stat, symbols, truncate_hash};

pub fn cmd_show(global: &Global, json: bool) -> Result<()> {
  let rt = runtime()?;
  let eval = evaluate_descriptor(global, &rt)?;

  if json {
    print_json(&serde_json::json!({
      "outputs": eval.outputs,
      "toolchain": eval.toolchain,
      "lock": eval.lock,
    }))?;
    return Ok(());
  }

  print_package(&eval);
  print_lock(&eval);
  Ok(())
}

fn heading(text: &str) {
  println!("{}", text.if_supports_color(Stream::Stdout, |s| s.bold()));
}

fn print_package(eval: &Evaluation) {
  let outputs = &eval.outputs;
  let package = &outputs.package;
  let hash = truncate_hash(&outputs.package_hash.0);

  heading(&format!("package {} ({hash})", package.name));
  if let Some(version) = &package.version {
    print_stat("Version", version);
  }
  print_stat("Source", &package.src);
  if let Some(toolchain) = &eval.toolchain {
    print_stat("Toolchain", &toolchain.name);
    print_stat("Host", &toolchain.host);
  }
  for tool in &eval.deps.tools {
    print_stat("Tool", &format!("{} {} {}", tool.name, symbols::ARROW, tool.prefix.display()));
  }
  for library in &eval.deps.libraries {
    print_stat(
      "Library",
      &format!(
        "{} {} {} {}",
        library.name, library.metadata.version, symbols::ARROW, library.pc_file.display()
      ),
    );
  }

  println!();
  match &outputs.app {
    Some(app) => {
      heading(&format!("app ({})", truncate_hash(&app.package.0)));
      print_stat("Program", &app.program);
      if !app.args.is_empty() {
        print_stat("Args", &app.args.join(" "));
      }
    }
    None => heading("app: none (no build section)"),
  }

  println!();
  let shell = &outputs.dev_shell;
  heading(&format!("dev shell ({})", truncate_hash(&shell.package.0)));
  for package in &shell.packages {
    print_stat("Package", &package.name);
  }
  for (name, value) in &shell.env {
    print_stat("Env", &format!("{name}={value}"));
  }
}

fn print_lock(eval: &Evaluation) {
  if eval.lock.is_empty() {
    return;
  }
  println!();
  heading(&format!("lock {}", eval.lock_path.display()));
  for (name, input) in &eval.lock.inputs {
    let mut line = format!("{} {}", input.url, truncate_hash(&input.sha256));
    if let Some(ts) = input.last_modified {
      let when = humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(ts));
      line.push_str(&format!(" ({when})"));
    }
    print_stat(name, &line);
  }
  if let Some(toolchain) = &eval.lock.toolchain {
    print_stat(
      "toolchain",
      &format!("{} {}", toolchain.name, truncate_hash(&toolchain.sha256)),
    );
  }
}
