//! Descriptor evaluation.
//!
//! `evaluate` runs every resolution step in order and either returns a
//! complete [`Evaluation`] or fails:
//!
//! 1. load the Lua descriptor and build the canonical package
//! 2. load the lock file and resolve inputs against it
//! 3. resolve and verify the toolchain pin
//! 4. resolve the native dependency set against the package index
//! 5. write the lock file if it changed
//!
//! Nothing is written before the last step succeeds.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument};

use crate::config::Settings;
use crate::deps::{DependencyError, PackageIndex, ResolvedDependencies};
use crate::descriptor::{self, Descriptor, DescriptorError};
use crate::inputs::{InputError, LOCK_FILENAME, LockError, LockFile, LockMode, LockedToolchain, resolve_inputs};
use crate::package::Outputs;
use crate::platform;
use crate::shell::{SessionError, ShellEnv, ShellEnvBuilder, ShellOptions};
use crate::toolchain::{self, ResolveContext, ToolchainError, ToolchainIdentity, install};

#[derive(Debug, Error)]
pub enum EvalError {
  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  #[error(transparent)]
  Lock(#[from] LockError),

  #[error(transparent)]
  Input(#[from] InputError),

  #[error(transparent)]
  Toolchain(#[from] ToolchainError),

  #[error(transparent)]
  Dependency(#[from] DependencyError),

  #[error("unsupported host platform")]
  UnsupportedPlatform,

  #[error("lock file '{path}' is out of date (run without --locked to update it)")]
  LockOutOfDate { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalOptions {
  /// Fail instead of changing the lock file.
  pub locked: bool,
}

/// A fully resolved descriptor.
#[derive(Debug, Clone)]
pub struct Evaluation {
  pub descriptor: Descriptor,
  pub outputs: Outputs,
  pub toolchain: Option<ToolchainIdentity>,
  pub deps: ResolvedDependencies,
  pub index: PackageIndex,
  pub lock: LockFile,
  pub lock_path: PathBuf,
  /// Whether `lock` differs from the file on disk before evaluation.
  pub lock_changed: bool,
  pub settings: Settings,
}

impl Evaluation {
  /// Project root.
  pub fn src_dir(&self) -> PathBuf {
    self.descriptor.src_dir()
  }

  /// Materializes the pinned toolchain and returns its `bin` directory.
  pub async fn toolchain_bin(&self) -> Result<Option<PathBuf>, ToolchainError> {
    match &self.toolchain {
      Some(identity) => Ok(Some(install::locate(identity, &self.settings).await?)),
      None => Ok(None),
    }
  }

  /// The dev shell environment: toolchain, build-time tools, link-time
  /// libraries, shell-only tools, then the declared session variables.
  pub fn shell_env<I>(&self, toolchain_bin: Option<&Path>, options: &ShellOptions, host: I) -> Result<ShellEnv, SessionError>
  where
    I: IntoIterator<Item = (String, String)>,
  {
    let shell = &self.outputs.dev_shell;
    ShellEnvBuilder::new(&shell.name)
      .options(options)
      .toolchain(toolchain_bin)
      .tools(&self.deps.tools)
      .libraries(&self.deps.libraries)
      .tools(&self.deps.shell_tools)
      .overrides(&shell.env)
      .build(host)
  }
}

/// Evaluates the descriptor at `path`.
pub async fn evaluate(path: &Path, settings: &Settings, options: &EvalOptions) -> Result<Evaluation, EvalError> {
  let mode = if options.locked { LockMode::Frozen } else { LockMode::Use };
  evaluate_with(path, settings, mode, true).await
}

/// Evaluation with explicit lock handling; `write_lock = false` leaves the
/// lock file untouched even if it changed.
#[instrument(skip_all, fields(path = %path.display()))]
pub(crate) async fn evaluate_with(
  path: &Path,
  settings: &Settings,
  mode: LockMode,
  write_lock: bool,
) -> Result<Evaluation, EvalError> {
  let descriptor = descriptor::load(path)?;
  let outputs = descriptor.outputs()?;

  let lock_path = descriptor.dir.join(LOCK_FILENAME);
  let existing = LockFile::load(&lock_path)?;
  let old_lock = existing.clone().unwrap_or_default();

  let inputs = resolve_inputs(
    &descriptor.decl.inputs,
    &old_lock,
    &mode,
    &descriptor.dir,
    &settings.inputs_dir(),
  )
  .await?;

  let toolchain = match &outputs.package.toolchain {
    Some(spec) => {
      let host = platform::rust_host().ok_or(EvalError::UnsupportedPlatform)?;
      let ctx = ResolveContext {
        dist_server: &settings.dist_server,
        base_dir: &descriptor.dir,
        manifests_dir: &settings.manifests_dir(),
        inputs: &inputs,
        host: &host,
      };
      Some(toolchain::resolve(spec, &ctx).await?)
    }
    None => None,
  };

  let index = PackageIndex::new(
    settings
      .index_roots
      .clone()
      .or_else(|| Some(descriptor.index_roots()).filter(|roots| !roots.is_empty()))
      .unwrap_or_else(PackageIndex::default_roots),
  );
  let deps = crate::deps::resolve(&outputs.package.deps, &outputs.dev_shell.packages, &index)?;

  let mut lock = LockFile::new();
  lock.inputs = inputs.into_iter().map(|(name, input)| (name, input.locked)).collect();
  lock.toolchain = toolchain.as_ref().map(LockedToolchain::from);

  let lock_changed = match &existing {
    Some(existing) => *existing != lock,
    None => !lock.is_empty(),
  };

  if lock_changed && mode == LockMode::Frozen {
    return Err(EvalError::LockOutOfDate { path: lock_path });
  }
  if lock_changed && write_lock {
    lock.save(&lock_path)?;
    info!(path = %lock_path.display(), "updated lock file");
  }

  info!(package = %outputs.package.name, hash = %outputs.package_hash, "evaluated descriptor");
  Ok(Evaluation {
    descriptor,
    outputs,
    toolchain,
    deps,
    index,
    lock,
    lock_path,
    lock_changed,
    settings: settings.clone(),
  })
}
