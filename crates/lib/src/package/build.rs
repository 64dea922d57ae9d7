//! Realizing the package: building the binary into the store.
//!
//! The store entry for a build lives at `<store>/packages/<key>-<name>`,
//! where the key covers everything that can change the binary: the package
//! hash, the toolchain identity, the source tree and the resolved dependency
//! prefixes. A completed entry carries a marker with the hash of its
//! contents and is reused as long as that hash still matches.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::consts::{COMPLETE_MARKER, RESULT_LINK, SOURCE_DATE_EPOCH};
use crate::eval::Evaluation;
use crate::package::BuildSettings;
use crate::shell::{SessionError, ShellEnv, ShellEnvBuilder, ShellOptions, host_vars};
use crate::toolchain::ToolchainError;
use crate::util::exe_name;
use crate::util::hash::{DirHashError, HashError, Hashable, ObjectHash, hash_directory};

/// Entries of the project root that never affect the build.
const SOURCE_EXCLUSIONS: &[&str] = &["target", ".git", RESULT_LINK];

/// Entries of a store entry left out of its output hash.
const OUTPUT_EXCLUSIONS: &[&str] = &[COMPLETE_MARKER];

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("package '{name}' has no build section (shell-only descriptor)")]
  NotBuildable { name: String },

  #[error("app and dev shell do not refer to package '{name}'")]
  Inconsistent { name: String },

  #[error(transparent)]
  Toolchain(#[from] ToolchainError),

  #[error(transparent)]
  Session(#[from] SessionError),

  #[error("cargo not found: pin a toolchain or add cargo to native_build_inputs")]
  CargoNotFound,

  #[error("failed to hash sources: {0}")]
  SourceHash(#[from] DirHashError),

  #[error("failed to compute build key: {0}")]
  Hash(#[from] HashError),

  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cargo build failed ({status}):\n{stderr}")]
  CargoFailed { status: String, stderr: String },

  #[error("build finished but '{path}' was not produced")]
  MissingArtifact { path: PathBuf },

  #[error("I/O error on '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("'{path}' exists and is not a symlink; refusing to replace it")]
  ResultLinkBlocked { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
  /// Create the `result` link in the project root.
  pub link: bool,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self { link: true }
  }
}

/// A realized package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutput {
  pub key: ObjectHash,
  pub out_dir: PathBuf,
  pub program: PathBuf,
  /// True when an existing store entry was reused.
  pub cached: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub link: Option<PathBuf>,
}

/// What goes into the build key.
#[derive(Serialize)]
struct BuildKey<'a> {
  package: &'a ObjectHash,
  toolchain: Option<ObjectHash>,
  src: String,
  deps: Vec<&'a Path>,
}

impl Hashable for BuildKey<'_> {}

/// Content of the completion marker.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildMarker {
  pub version: u32,
  pub name: String,
  pub key: ObjectHash,
  pub package: ObjectHash,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub toolchain: Option<String>,
  pub output_hash: String,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
  move |source| BuildError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// Computes the build key of the evaluated package.
pub fn build_key(eval: &Evaluation) -> Result<ObjectHash, BuildError> {
  let src = hash_directory(&eval.src_dir(), SOURCE_EXCLUSIONS)?;
  let key = BuildKey {
    package: &eval.outputs.package_hash,
    toolchain: eval.toolchain.as_ref().map(|t| t.compute_hash()).transpose()?,
    src: src.0,
    deps: eval.deps.prefixes(),
  };
  Ok(key.compute_hash()?)
}

/// The environment cargo runs in: pure, with the toolchain and declared
/// dependencies only. Session-only variables are not part of it.
pub fn build_env(eval: &Evaluation, toolchain_bin: Option<&Path>, target_dir: &Path) -> Result<ShellEnv, SessionError> {
  ShellEnvBuilder::new(&eval.outputs.package.name)
    .options(&ShellOptions::default())
    .toolchain(toolchain_bin)
    .tools(&eval.deps.tools)
    .libraries(&eval.deps.libraries)
    .var("CARGO_TARGET_DIR", &target_dir.to_string_lossy())
    .var("SOURCE_DATE_EPOCH", SOURCE_DATE_EPOCH)
    .var("LANG", "C")
    .var("LC_ALL", "C")
    .build(host_vars())
}

/// Builds the package, or reuses a completed store entry.
#[instrument(skip_all, fields(package = %eval.outputs.package.name))]
pub async fn realize(eval: &Evaluation, options: &BuildOptions) -> Result<BuildOutput, BuildError> {
  let package = &eval.outputs.package;
  let build = package.build.as_ref().ok_or_else(|| BuildError::NotBuildable {
    name: package.name.clone(),
  })?;
  if !eval.outputs.is_consistent() {
    return Err(BuildError::Inconsistent {
      name: package.name.clone(),
    });
  }

  let key = build_key(eval)?;
  let packages_dir = eval.settings.packages_dir();
  let out_dir = packages_dir.join(format!("{key}-{}", package.name));
  let program = out_dir.join("bin").join(exe_name(&build.bin));

  let cached = is_complete(&out_dir).await && program.is_file();
  if cached {
    info!(out = %out_dir.display(), "using cached build");
  } else {
    let toolchain_bin = eval.toolchain_bin().await?;
    let target_dir = eval.settings.build_dir().join(key.to_string());
    let env = build_env(eval, toolchain_bin.as_deref(), &target_dir)?;
    let cargo = env.which("cargo").ok_or(BuildError::CargoNotFound)?;

    run_cargo(&cargo, build, &eval.src_dir(), &env).await?;

    let artifact = target_dir.join(build.profile_dir()).join(exe_name(&build.bin));
    if !artifact.is_file() {
      return Err(BuildError::MissingArtifact { path: artifact });
    }

    let marker = BuildMarker {
      version: 1,
      name: package.name.clone(),
      key: key.clone(),
      package: eval.outputs.package_hash.clone(),
      toolchain: eval.toolchain.as_ref().map(|t| t.name.clone()),
      output_hash: String::new(),
    };
    install_output(&artifact, &packages_dir, &out_dir, &build.bin, marker).await?;
    info!(out = %out_dir.display(), "build complete");
  }

  let link = if options.link {
    Some(link_result(&eval.src_dir(), &out_dir).await?)
  } else {
    None
  };

  Ok(BuildOutput {
    key,
    out_dir,
    program,
    cached,
    link,
  })
}

async fn run_cargo(cargo: &Path, build: &BuildSettings, src_dir: &Path, env: &ShellEnv) -> Result<(), BuildError> {
  let mut cmd = Command::new(cargo);
  cmd.arg("build").args(["--profile", build.profile.as_str(), "--bin", build.bin.as_str()]);
  if !build.features.is_empty() {
    cmd.args(["--features", build.features.join(",").as_str()]);
  }
  if build.locked {
    cmd.arg("--locked");
  }
  cmd.args(&build.cargo_args);
  cmd.current_dir(src_dir).env_clear().envs(env.vars());

  info!(cargo = %cargo.display(), profile = %build.profile, bin = %build.bin, "running cargo build");
  let output = cmd.output().await.map_err(|source| BuildError::Spawn {
    program: cargo.to_path_buf(),
    source,
  })?;

  let stderr = String::from_utf8_lossy(&output.stderr);
  if !output.status.success() {
    let tail: Vec<&str> = stderr.lines().rev().take(20).collect();
    return Err(BuildError::CargoFailed {
      status: output.status.to_string(),
      stderr: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
    });
  }
  if !stderr.is_empty() {
    debug!(stderr = %stderr, "cargo output");
  }
  Ok(())
}

/// Copies the artifact into a fresh store entry. The entry is assembled
/// under a temporary name and renamed into place, then marked complete.
async fn install_output(
  artifact: &Path,
  packages_dir: &Path,
  out_dir: &Path,
  bin: &str,
  mut marker: BuildMarker,
) -> Result<(), BuildError> {
  let tmp = packages_dir.join(format!(".{}.tmp-{}", marker.key, std::process::id()));
  if fs::try_exists(&tmp).await.unwrap_or(false) {
    fs::remove_dir_all(&tmp).await.map_err(io_err(&tmp))?;
  }
  let tmp_bin = tmp.join("bin");
  fs::create_dir_all(&tmp_bin).await.map_err(io_err(&tmp_bin))?;
  let dest = tmp_bin.join(exe_name(bin));
  fs::copy(artifact, &dest).await.map_err(io_err(&dest))?;

  marker.output_hash = hash_directory(&tmp, OUTPUT_EXCLUSIONS)?.0;
  let content = serde_json::to_string(&marker)?;
  let marker_path = tmp.join(COMPLETE_MARKER);
  fs::write(&marker_path, format!("{content}\n"))
    .await
    .map_err(io_err(&marker_path))?;

  if fs::try_exists(out_dir).await.unwrap_or(false) {
    fs::remove_dir_all(out_dir).await.map_err(io_err(out_dir))?;
  }
  fs::rename(&tmp, out_dir).await.map_err(io_err(out_dir))?;
  Ok(())
}

/// Reads the completion marker of a store entry.
pub async fn read_marker(out_dir: &Path) -> Option<BuildMarker> {
  let content = fs::read_to_string(out_dir.join(COMPLETE_MARKER)).await.ok()?;
  serde_json::from_str(&content).ok()
}

/// A store entry is complete when its marker exists and its contents still
/// hash to what the marker recorded.
async fn is_complete(out_dir: &Path) -> bool {
  let Some(marker) = read_marker(out_dir).await else {
    return false;
  };
  match hash_directory(out_dir, OUTPUT_EXCLUSIONS) {
    Ok(actual) if actual.0 == marker.output_hash => true,
    Ok(actual) => {
      warn!(
        path = %out_dir.display(),
        expected = %marker.output_hash,
        actual = %actual,
        "build output corrupted, will rebuild"
      );
      false
    }
    Err(e) => {
      warn!(path = %out_dir.display(), error = %e, "failed to hash build output, will rebuild");
      false
    }
  }
}

/// Points `<src>/result` at the store entry.
async fn link_result(src_dir: &Path, out_dir: &Path) -> Result<PathBuf, BuildError> {
  let link = src_dir.join(RESULT_LINK);
  if let Ok(meta) = fs::symlink_metadata(&link).await {
    if !meta.file_type().is_symlink() {
      return Err(BuildError::ResultLinkBlocked { path: link });
    }
    fs::remove_file(&link).await.map_err(io_err(&link))?;
  }

  #[cfg(unix)]
  fs::symlink(out_dir, &link).await.map_err(io_err(&link))?;
  #[cfg(windows)]
  fs::symlink_dir(out_dir, &link).await.map_err(io_err(&link))?;

  debug!(link = %link.display(), target = %out_dir.display(), "linked result");
  Ok(link)
}
