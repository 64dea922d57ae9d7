use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase in which a dependency is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
  Tool,
  Library,
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Role::Tool => write!(f, "build-time tool"),
      Role::Library => write!(f, "link-time library"),
    }
  }
}

/// A single named dependency.
///
/// `exe` and `pkg_config` override the file looked up in the index; both
/// default to `name` (e.g. `freetype` ships `freetype2.pc`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exe: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pkg_config: Option<String>,
}

impl Dependency {
  pub fn named(name: &str) -> Self {
    Self {
      name: name.to_string(),
      exe: None,
      pkg_config: None,
    }
  }

  pub fn with_exe(mut self, exe: &str) -> Self {
    self.exe = Some(exe.to_string());
    self
  }

  pub fn with_pkg_config(mut self, pc: &str) -> Self {
    self.pkg_config = Some(pc.to_string());
    self
  }

  pub fn exe_name(&self) -> &str {
    self.exe.as_deref().unwrap_or(&self.name)
  }

  pub fn pc_name(&self) -> &str {
    self.pkg_config.as_deref().unwrap_or(&self.name)
  }
}

/// The two dependency sets of a package, kept sorted by name so that
/// declaration order never changes the package identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySet {
  pub native_build_inputs: Vec<Dependency>,
  pub build_inputs: Vec<Dependency>,
}

/// A dependency that could not be found in the package index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Missing {
  pub name: String,
  pub role: Role,
  /// What was looked for, e.g. `bin/cmake` or `freetype2.pc`.
  pub wanted: String,
  /// Set when `wanted` exists but could not be used.
  pub invalid: Option<String>,
}

impl fmt::Display for Missing {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.invalid {
      Some(reason) => write!(f, "{} '{}' ({}: {reason})", self.role, self.name, self.wanted),
      None => write!(f, "{} '{}' ({} not found)", self.role, self.name, self.wanted),
    }
  }
}

#[derive(Debug, Error)]
pub enum DependencyError {
  #[error("empty dependency name in {role} list")]
  EmptyName { role: Role },

  #[error("{role} '{name}' is declared more than once")]
  Duplicate { name: String, role: Role },

  #[error("'{name}' is declared both as a build-time tool and a link-time library")]
  RoleConflict { name: String },

  #[error("unresolved dependencies in index [{}]: {}", join_roots(.roots), join_missing(.missing))]
  Unresolved { missing: Vec<Missing>, roots: Vec<PathBuf> },

  #[error("invalid pkg-config file '{path}': {message}")]
  PkgConfig { path: PathBuf, message: String },
}

fn join_roots(roots: &[PathBuf]) -> String {
  roots.iter().map(|r| r.display().to_string()).collect::<Vec<_>>().join(", ")
}

fn join_missing(missing: &[Missing]) -> String {
  missing.iter().map(Missing::to_string).collect::<Vec<_>>().join("; ")
}

impl DependencySet {
  /// Builds a validated, sorted dependency set.
  pub fn new(native_build_inputs: Vec<Dependency>, build_inputs: Vec<Dependency>) -> Result<Self, DependencyError> {
    let mut set = Self {
      native_build_inputs,
      build_inputs,
    };
    set.native_build_inputs.sort();
    set.build_inputs.sort();
    set.validate()?;
    Ok(set)
  }

  /// Checks names are non-empty, unique within a role, and that no name is
  /// used in both roles.
  pub fn validate(&self) -> Result<(), DependencyError> {
    let tools = unique_names(&self.native_build_inputs, Role::Tool)?;
    let libraries = unique_names(&self.build_inputs, Role::Library)?;

    if let Some(name) = tools.intersection(&libraries).next() {
      return Err(DependencyError::RoleConflict {
        name: name.to_string(),
      });
    }
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.native_build_inputs.is_empty() && self.build_inputs.is_empty()
  }

  /// Whether `name` is declared as a link-time library.
  pub fn is_library(&self, name: &str) -> bool {
    self.build_inputs.iter().any(|d| d.name == name)
  }
}

fn unique_names(deps: &[Dependency], role: Role) -> Result<BTreeSet<&str>, DependencyError> {
  let mut names = BTreeSet::new();
  for dep in deps {
    if dep.name.trim().is_empty() {
      return Err(DependencyError::EmptyName { role });
    }
    if !names.insert(dep.name.as_str()) {
      return Err(DependencyError::Duplicate {
        name: dep.name.clone(),
        role,
      });
    }
  }
  Ok(names)
}
