use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::DescriptorError;
use crate::deps::{Dependency, DependencyError, DependencySet};
use crate::inputs::InputDecl;
use crate::package::{BuildSettings, Outputs, Package};
use crate::shell::is_var_name;
use crate::toolchain::{ToolchainPin, ToolchainSpec};

/// The table a descriptor returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorDecl {
  pub name: String,
  #[serde(default)]
  pub version: Option<String>,
  /// Project root relative to the descriptor, `.` when omitted.
  #[serde(default)]
  pub src: Option<String>,
  #[serde(default)]
  pub inputs: BTreeMap<String, InputDecl>,
  #[serde(default)]
  pub toolchain: Option<ToolchainDecl>,
  #[serde(default)]
  pub native_build_inputs: Vec<DependencyDecl>,
  #[serde(default)]
  pub build_inputs: Vec<DependencyDecl>,
  /// Base package index roots, relative to the descriptor.
  #[serde(default)]
  pub index: Vec<String>,
  #[serde(default)]
  pub build: Option<BuildDecl>,
  #[serde(default)]
  pub app: Option<AppDecl>,
  #[serde(default)]
  pub shell: ShellDecl,
}

/// Exactly one of `overlay` or `dated` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainDecl {
  #[serde(default)]
  pub overlay: Option<OverlayDecl>,
  #[serde(default)]
  pub dated: Option<DatedDecl>,
  #[serde(default)]
  pub components: Vec<String>,
  #[serde(default)]
  pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlayDecl {
  pub input: String,
  pub channel: String,
  #[serde(default = "latest")]
  pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatedDecl {
  #[serde(default = "nightly")]
  pub channel: String,
  pub date: String,
  pub sha256: String,
}

fn latest() -> String {
  "latest".to_string()
}

fn nightly() -> String {
  "nightly".to_string()
}

/// `"cmake"` or `{ name = "freetype", pkg_config = "freetype2" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDecl {
  Name(String),
  Full {
    name: String,
    #[serde(default)]
    exe: Option<String>,
    #[serde(default)]
    pkg_config: Option<String>,
  },
}

impl From<&DependencyDecl> for Dependency {
  fn from(decl: &DependencyDecl) -> Self {
    match decl {
      DependencyDecl::Name(name) => Dependency::named(name),
      DependencyDecl::Full { name, exe, pkg_config } => Dependency {
        name: name.clone(),
        exe: exe.clone(),
        pkg_config: pkg_config.clone(),
      },
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDecl {
  /// Defaults to the package name.
  #[serde(default)]
  pub bin: Option<String>,
  #[serde(default)]
  pub profile: Option<String>,
  #[serde(default)]
  pub features: Vec<String>,
  #[serde(default)]
  pub locked: bool,
  #[serde(default)]
  pub cargo_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppDecl {
  /// Arguments placed before the user's.
  #[serde(default)]
  pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellDecl {
  #[serde(default)]
  pub packages: Vec<DependencyDecl>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
}

/// A loaded descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
  /// Canonical path of the descriptor file.
  pub path: PathBuf,
  /// Directory containing it.
  pub dir: PathBuf,
  pub decl: DescriptorDecl,
}

impl Descriptor {
  fn invalid(&self, message: impl Into<String>) -> DescriptorError {
    DescriptorError::Invalid {
      path: self.path.clone(),
      message: message.into(),
    }
  }

  /// Validates the declaration and builds the canonical package.
  pub fn to_package(&self) -> Result<Package, DescriptorError> {
    let decl = &self.decl;
    if !is_valid_name(&decl.name) {
      return Err(self.invalid(format!(
        "package name '{}' must be non-empty and use only letters, digits, '-', '_' or '.'",
        decl.name
      )));
    }

    let toolchain = decl.toolchain.as_ref().map(|t| self.toolchain_spec(t)).transpose()?;
    let deps = DependencySet::new(
      decl.native_build_inputs.iter().map(Dependency::from).collect(),
      decl.build_inputs.iter().map(Dependency::from).collect(),
    )?;

    let build = decl.build.as_ref().map(|b| BuildSettings {
      bin: b.bin.clone().unwrap_or_else(|| decl.name.clone()),
      profile: b.profile.clone().unwrap_or_else(|| "release".to_string()),
      features: b.features.clone(),
      locked: b.locked,
      cargo_args: b.cargo_args.clone(),
    });
    if let Some(build) = &build
      && (build.bin.is_empty() || build.profile.is_empty())
    {
      return Err(self.invalid("build.bin and build.profile must not be empty"));
    }

    Ok(Package {
      name: decl.name.clone(),
      version: decl.version.clone(),
      src: decl.src.clone().unwrap_or_else(|| ".".to_string()),
      toolchain,
      deps,
      build,
    })
  }

  /// Builds the package and derives its app and dev shell.
  pub fn outputs(&self) -> Result<Outputs, DescriptorError> {
    let package = self.to_package()?;
    let decl = &self.decl;

    if decl.app.is_some() && decl.build.is_none() {
      return Err(self.invalid("'app' requires a 'build' section"));
    }

    let shell_packages: Vec<Dependency> = decl.shell.packages.iter().map(Dependency::from).collect();
    for dep in &shell_packages {
      if package.deps.is_library(&dep.name) {
        return Err(DependencyError::RoleConflict { name: dep.name.clone() }.into());
      }
    }

    for (key, value) in &decl.shell.env {
      if !is_var_name(key) || value.contains('\0') {
        return Err(self.invalid(format!("invalid shell variable '{key}'")));
      }
    }

    let app_args = decl.app.as_ref().map(|a| a.args.clone()).unwrap_or_default();
    Ok(Outputs::from_package(
      package,
      app_args,
      shell_packages,
      decl.shell.env.clone(),
    )?)
  }

  /// Index roots declared in the descriptor, resolved against its directory.
  pub fn index_roots(&self) -> Vec<PathBuf> {
    self.decl.index.iter().map(|root| self.dir.join(root)).collect()
  }

  /// Project root.
  pub fn src_dir(&self) -> PathBuf {
    match self.decl.src.as_deref() {
      Some(src) if Path::new(src).is_absolute() => PathBuf::from(src),
      Some(src) => self.dir.join(src),
      None => self.dir.clone(),
    }
  }

  fn toolchain_spec(&self, decl: &ToolchainDecl) -> Result<ToolchainSpec, DescriptorError> {
    let pin = match (&decl.overlay, &decl.dated) {
      (Some(overlay), None) => {
        if !self.decl.inputs.contains_key(&overlay.input) {
          return Err(self.invalid(format!(
            "toolchain.overlay.input '{}' is not declared in inputs",
            overlay.input
          )));
        }
        ToolchainPin::Overlay {
          input: overlay.input.clone(),
          channel: overlay.channel.parse()?,
          version: overlay.version.clone(),
        }
      }
      (None, Some(dated)) => ToolchainPin::Dated {
        channel: dated.channel.parse()?,
        date: dated.date.clone(),
        sha256: dated.sha256.clone(),
      },
      _ => return Err(self.invalid("toolchain must set exactly one of 'overlay' or 'dated'")),
    };
    Ok(ToolchainSpec::new(pin, decl.components.clone(), decl.targets.clone())?)
  }
}

fn is_valid_name(name: &str) -> bool {
  !name.is_empty()
    && !name.starts_with('.')
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
