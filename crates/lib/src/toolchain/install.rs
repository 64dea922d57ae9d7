//! Materializing a resolved toolchain on disk.
//!
//! A toolchain directory `<toolchains_dir>/<name>/bin/cargo` is used as is.
//! Otherwise rustup installs the exact toolchain name (minimal profile plus
//! the requested components and targets) and reports where it put it.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::types::{ToolchainError, ToolchainIdentity};
use crate::config::Settings;
use crate::util::exe_name;

/// Returns the `bin` directory of the toolchain, installing it if needed.
#[instrument(skip_all, fields(toolchain = %identity.name))]
pub async fn locate(identity: &ToolchainIdentity, settings: &Settings) -> Result<PathBuf, ToolchainError> {
  let bin = settings.toolchains_dir.join(&identity.name).join("bin");
  if bin.join(exe_name("cargo")).is_file() {
    debug!(bin = %bin.display(), "using pre-installed toolchain");
    return Ok(bin);
  }

  if !settings.use_rustup {
    return Err(ToolchainError::NotInstalled {
      toolchain: identity.name.clone(),
      dir: settings.toolchains_dir.display().to_string(),
    });
  }

  install_with_rustup(identity).await?;
  rustup_bin_dir(identity).await
}

async fn install_with_rustup(identity: &ToolchainIdentity) -> Result<(), ToolchainError> {
  let mut cmd = Command::new("rustup");
  cmd.args(["toolchain", "install", identity.name.as_str(), "--profile", "minimal", "--no-self-update"]);
  for component in &identity.components {
    cmd.args(["--component", component.as_str()]);
  }
  for target in &identity.targets {
    cmd.args(["--target", target.as_str()]);
  }

  info!("installing toolchain with rustup");
  let output = cmd.output().await.map_err(|e| install_error(identity, format!("failed to run rustup: {e}")))?;
  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(install_error(identity, format!("rustup exited with {}: {}", output.status, stderr.trim())));
  }
  Ok(())
}

async fn rustup_bin_dir(identity: &ToolchainIdentity) -> Result<PathBuf, ToolchainError> {
  let output = Command::new("rustup")
    .args(["which", "--toolchain", identity.name.as_str(), "cargo"])
    .output()
    .await
    .map_err(|e| install_error(identity, format!("failed to run rustup: {e}")))?;
  if !output.status.success() {
    return Err(install_error(identity, "rustup cannot locate cargo".to_string()));
  }

  let cargo = String::from_utf8_lossy(&output.stdout).trim().to_string();
  Path::new(&cargo)
    .parent()
    .map(Path::to_path_buf)
    .ok_or_else(|| install_error(identity, format!("unexpected cargo path '{cargo}'")))
}

fn install_error(identity: &ToolchainIdentity, message: String) -> ToolchainError {
  ToolchainError::Install {
    toolchain: identity.name.clone(),
    message,
  }
}
