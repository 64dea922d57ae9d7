//! Implementation of the `envpin check` command.
//!
//! Evaluates the descriptor (inputs, toolchain pin, native dependencies)
//! without building anything. Any resolution failure is an error.

use anyhow::Result;

use envpin_lib::eval::Evaluation;

use super::{Global, evaluate_descriptor, runtime};
use crate::output::{print_info, print_json, print_stat, print_success, truncate_hash};

pub fn cmd_check(global: &Global, json: bool) -> Result<()> {
  let rt = runtime()?;
  let eval = evaluate_descriptor(global, &rt)?;

  if json {
    print_json(&summary(&eval))?;
    return Ok(());
  }

  let package = &eval.outputs.package;
  print_success(&format!(
    "{} ({})",
    package.name,
    truncate_hash(&eval.outputs.package_hash.0)
  ));
  if let Some(toolchain) = &eval.toolchain {
    print_stat("Toolchain", &format!("{} ({})", toolchain.name, toolchain.rustc));
  }
  let names = |names: Vec<&str>| if names.is_empty() { "-".to_string() } else { names.join(", ") };
  print_stat("Tools", &names(eval.deps.tools.iter().map(|t| t.name.as_str()).collect()));
  print_stat(
    "Libraries",
    &names(eval.deps.libraries.iter().map(|l| l.name.as_str()).collect()),
  );
  print_stat("Buildable", if package.build.is_some() { "yes" } else { "no" });
  if eval.lock_changed {
    print_info(&format!("Lock file updated: {}", eval.lock_path.display()));
  }
  Ok(())
}

fn summary(eval: &Evaluation) -> serde_json::Value {
  serde_json::json!({
    "name": eval.outputs.package.name,
    "package_hash": eval.outputs.package_hash.0,
    "toolchain": eval.toolchain,
    "tools": eval.deps.tools,
    "libraries": eval.deps.libraries,
    "buildable": eval.outputs.package.build.is_some(),
    "lock_changed": eval.lock_changed,
  })
}
