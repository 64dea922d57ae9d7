//! Process-wide settings.
//!
//! Project configuration lives in the descriptor; this module only covers the
//! machine-level knobs, read from the environment with XDG-based defaults:
//!
//! | Variable              | Meaning                                          |
//! |-----------------------|--------------------------------------------------|
//! | `ENVPIN_STORE`        | store directory (manifests, inputs, packages)    |
//! | `ENVPIN_TOOLCHAINS`   | directory of pre-installed toolchains            |
//! | `ENVPIN_DIST_SERVER`  | Rust dist server (URL or local directory)        |
//! | `ENVPIN_INDEX_PATH`   | base package index roots, `:`-separated          |
//! | `ENVPIN_NO_RUSTUP`    | `1` disables installing toolchains with rustup   |

use std::path::PathBuf;

use crate::consts::DEFAULT_DIST_SERVER;
use crate::platform::paths::{default_store_dir, default_toolchains_dir};

pub const ENV_STORE: &str = "ENVPIN_STORE";
pub const ENV_TOOLCHAINS: &str = "ENVPIN_TOOLCHAINS";
pub const ENV_DIST_SERVER: &str = "ENVPIN_DIST_SERVER";
pub const ENV_INDEX_PATH: &str = "ENVPIN_INDEX_PATH";
pub const ENV_NO_RUSTUP: &str = "ENVPIN_NO_RUSTUP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub store_dir: PathBuf,
  pub toolchains_dir: PathBuf,
  pub dist_server: String,
  /// Index roots from the environment. Take precedence over the descriptor's
  /// `index` list when set.
  pub index_roots: Option<Vec<PathBuf>>,
  pub use_rustup: bool,
}

impl Settings {
  pub fn from_env() -> Self {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

    Self {
      store_dir: var(ENV_STORE).map(PathBuf::from).unwrap_or_else(default_store_dir),
      toolchains_dir: var(ENV_TOOLCHAINS)
        .map(PathBuf::from)
        .unwrap_or_else(default_toolchains_dir),
      dist_server: var(ENV_DIST_SERVER).unwrap_or_else(|| DEFAULT_DIST_SERVER.to_string()),
      index_roots: var(ENV_INDEX_PATH).map(|v| std::env::split_paths(&v).collect()),
      use_rustup: !matches!(var(ENV_NO_RUSTUP).as_deref(), Some("1") | Some("true")),
    }
  }

  /// Verified channel manifests, keyed by sha256.
  pub fn manifests_dir(&self) -> PathBuf {
    self.store_dir.join("manifests")
  }

  /// Fetched input documents, keyed by sha256.
  pub fn inputs_dir(&self) -> PathBuf {
    self.store_dir.join("inputs")
  }

  /// Realized package outputs.
  pub fn packages_dir(&self) -> PathBuf {
    self.store_dir.join("packages")
  }

  /// Cargo target directories, one per build key.
  pub fn build_dir(&self) -> PathBuf {
    self.store_dir.join("build")
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self::from_env()
  }
}
