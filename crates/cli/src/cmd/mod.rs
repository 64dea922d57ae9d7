mod build;
mod check;
mod develop;
mod info;
mod init;
mod print_env;
mod run;
mod show;
mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use envpin_lib::config::Settings;
use envpin_lib::eval::{EvalOptions, Evaluation, evaluate};
use envpin_lib::update::find_descriptor;

pub use build::cmd_build;
pub use check::cmd_check;
pub use develop::cmd_develop;
pub use info::cmd_info;
pub use init::cmd_init;
pub use print_env::cmd_print_env;
pub use run::cmd_run;
pub use show::cmd_show;
pub use update::cmd_update;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Global {
  pub file: Option<PathBuf>,
  pub locked: bool,
}

impl Global {
  pub fn descriptor_path(&self) -> Result<PathBuf> {
    Ok(find_descriptor(self.file.as_deref())?)
  }
}

pub fn runtime() -> Result<Runtime> {
  Runtime::new().context("Failed to create async runtime")
}

/// Evaluates the selected descriptor on `rt`.
pub fn evaluate_descriptor(global: &Global, rt: &Runtime) -> Result<Evaluation> {
  let path = global.descriptor_path()?;
  let settings = Settings::from_env();
  let options = EvalOptions { locked: global.locked };
  rt.block_on(evaluate(&path, &settings, &options))
    .with_context(|| format!("Failed to evaluate {}", path.display()))
}
