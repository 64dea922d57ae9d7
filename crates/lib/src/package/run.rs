//! Running the app.

use tokio::process::Command;
use tracing::info;

use super::build::{BuildError, BuildOptions, realize};
use crate::eval::Evaluation;
use crate::shell::session::exit_code;
use crate::util::exe_name;

/// Realizes the package and runs the app's program with its default
/// arguments followed by `args`. Returns the program's exit code.
///
/// The program inherits the invoking environment; only the dev shell is
/// isolated.
pub async fn run(eval: &Evaluation, args: &[String], options: &BuildOptions) -> Result<i32, BuildError> {
  let app = eval.outputs.app.as_ref().ok_or_else(|| BuildError::NotBuildable {
    name: eval.outputs.package.name.clone(),
  })?;

  let output = realize(eval, options).await?;
  let program = output.out_dir.join("bin").join(exe_name(&app.program));
  info!(program = %program.display(), "running app");

  let status = Command::new(&program)
    .args(&app.args)
    .args(args)
    .status()
    .await
    .map_err(|source| BuildError::Spawn {
      program: program.clone(),
      source,
    })?;
  Ok(exit_code(status))
}
