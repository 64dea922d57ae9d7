//! Refreshing the lock file.
//!
//! `update_lock` re-fetches the selected inputs (all when none are named)
//! ignoring their locked hashes, re-resolves the toolchain through them and
//! reports what moved. The new lock is written only after the whole
//! descriptor resolves, and never in dry-run mode.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Settings;
use crate::consts::DESCRIPTOR_FILENAME;
use crate::eval::{EvalError, evaluate_with};
use crate::inputs::{LOCK_FILENAME, LockFile, LockMode, LockedToolchain};

#[derive(Debug, Error)]
pub enum UpdateError {
  #[error("descriptor not found: {path}")]
  DescriptorNotFound { path: String },

  #[error(transparent)]
  Eval(#[from] EvalError),
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
  /// Inputs to refresh; empty refreshes all.
  pub inputs: Vec<String>,
  pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
  /// Inputs whose hash changed: name → (old sha256, new sha256).
  pub updated: BTreeMap<String, (String, String)>,
  pub added: Vec<String>,
  pub removed: Vec<String>,
  pub unchanged: Vec<String>,
  /// Toolchain name before and after, when it changed.
  pub toolchain: Option<(Option<String>, Option<String>)>,
  pub lock_path: PathBuf,
  pub lock_changed: bool,
}

/// Finds the descriptor to use.
///
/// An explicit path must exist; otherwise `./envpin.lua` is used.
pub fn find_descriptor(explicit: Option<&Path>) -> Result<PathBuf, UpdateError> {
  let path = explicit.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DESCRIPTOR_FILENAME));
  if path.is_file() {
    Ok(path)
  } else {
    Err(UpdateError::DescriptorNotFound {
      path: path.display().to_string(),
    })
  }
}

/// Updates the lock file of the descriptor at `path`.
pub async fn update_lock(path: &Path, settings: &Settings, options: &UpdateOptions) -> Result<UpdateResult, UpdateError> {
  let lock_path = path
    .parent()
    .map(|dir| dir.join(LOCK_FILENAME))
    .unwrap_or_else(|| PathBuf::from(LOCK_FILENAME));
  let old = LockFile::load(&lock_path).map_err(EvalError::from)?.unwrap_or_default();

  let eval = evaluate_with(
    path,
    settings,
    LockMode::Refresh(options.inputs.clone()),
    !options.dry_run,
  )
  .await?;

  let mut result = diff(&old, &eval.lock);
  result.lock_path = eval.lock_path;
  result.lock_changed = eval.lock_changed;
  Ok(result)
}

fn diff(old: &LockFile, new: &LockFile) -> UpdateResult {
  let mut result = UpdateResult::default();
  for (name, entry) in &new.inputs {
    match old.get(name) {
      None => result.added.push(name.clone()),
      Some(prev) if prev.sha256 != entry.sha256 || prev.url != entry.url => {
        result
          .updated
          .insert(name.clone(), (prev.sha256.clone(), entry.sha256.clone()));
      }
      Some(_) => result.unchanged.push(name.clone()),
    }
  }
  result.removed = old
    .inputs
    .keys()
    .filter(|name| !new.inputs.contains_key(*name))
    .cloned()
    .collect();

  let name = |t: &Option<LockedToolchain>| t.as_ref().map(|t| t.name.clone());
  if old.toolchain != new.toolchain {
    result.toolchain = Some((name(&old.toolchain), name(&new.toolchain)));
  }
  result
}
