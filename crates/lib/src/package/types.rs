use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::deps::{Dependency, DependencySet};
use crate::toolchain::ToolchainSpec;
use crate::util::hash::{HashError, Hashable, ObjectHash};

/// How the package binary is built with cargo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
  /// Binary target, and the program the app runs.
  pub bin: String,
  pub profile: String,
  pub features: Vec<String>,
  /// Pass `--locked` to cargo.
  pub locked: bool,
  pub cargo_args: Vec<String>,
}

impl BuildSettings {
  /// Directory cargo places artifacts of this profile in.
  pub fn profile_dir(&self) -> &str {
    match self.profile.as_str() {
      "dev" | "test" => "debug",
      "bench" => "release",
      other => other,
    }
  }
}

/// The canonical package definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  /// Project root relative to the descriptor directory.
  pub src: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub toolchain: Option<ToolchainSpec>,
  pub deps: DependencySet,
  /// `None` for shell-only descriptors.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub build: Option<BuildSettings>,
}

impl Hashable for Package {}

/// Runnable entry point wrapping the package's binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
  pub package: ObjectHash,
  pub program: String,
  pub args: Vec<String>,
}

/// Development shell over the package's dependency set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevShell {
  pub package: ObjectHash,
  pub name: String,
  /// Extra tools available only inside the shell.
  pub packages: Vec<Dependency>,
  /// Session-only variables, applied verbatim.
  pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
  pub package_hash: ObjectHash,
  pub package: Package,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub app: Option<App>,
  pub dev_shell: DevShell,
}

impl Outputs {
  /// Derives the app (when the package is buildable) and dev shell from the
  /// package hash.
  pub fn from_package(
    package: Package,
    app_args: Vec<String>,
    shell_packages: Vec<Dependency>,
    shell_env: BTreeMap<String, String>,
  ) -> Result<Self, HashError> {
    let package_hash = package.compute_hash()?;
    let app = package.build.as_ref().map(|build| App {
      package: package_hash.clone(),
      program: build.bin.clone(),
      args: app_args,
    });
    let dev_shell = DevShell {
      package: package_hash.clone(),
      name: package.name.clone(),
      packages: shell_packages,
      env: shell_env,
    };
    Ok(Self {
      package_hash,
      package,
      app,
      dev_shell,
    })
  }

  /// True when app and dev shell both refer to this package.
  pub fn is_consistent(&self) -> bool {
    self.dev_shell.package == self.package_hash
      && self.app.as_ref().is_none_or(|app| app.package == self.package_hash)
      && self.package.compute_hash().is_ok_and(|h| h == self.package_hash)
  }
}
