use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::SessionError;
use crate::deps::{ResolvedLibrary, ResolvedTool};

/// Host variables a pure session inherits.
pub const KEEP_VARS: &[&str] = &[
  "HOME",
  "USER",
  "LOGNAME",
  "TERM",
  "LANG",
  "LC_ALL",
  "TZ",
  "DISPLAY",
  "WAYLAND_DISPLAY",
  "XDG_RUNTIME_DIR",
  "SHELL",
  "CARGO_HOME",
  "RUSTUP_HOME",
];

/// Set in every session to the package name.
pub const SHELL_MARKER_VAR: &str = "ENVPIN_SHELL";

/// True for names a POSIX shell accepts in `export NAME=...`.
pub fn is_var_name(name: &str) -> bool {
  let mut chars = name.chars();
  chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// UTF-8 pairs out of raw environment entries; anything else is skipped.
pub fn utf8_vars<I>(vars: I) -> Vec<(String, String)>
where
  I: IntoIterator<Item = (OsString, OsString)>,
{
  vars
    .into_iter()
    .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
      (Ok(name), Ok(value)) => Some((name, value)),
      (name, _) => {
        let name = name.unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
        debug!(name = %name, "skipping non UTF-8 host variable");
        None
      }
    })
    .collect()
}

/// The invoking process environment, as [`ShellEnvBuilder::build`] takes it.
pub fn host_vars() -> Vec<(String, String)> {
  utf8_vars(std::env::vars_os())
}

/// User-facing knobs for a session environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOptions {
  /// Start from [`KEEP_VARS`] only (default) instead of the full host
  /// environment.
  pub pure: bool,
  /// Additional host variables to keep in pure mode.
  pub keep: Vec<String>,
}

impl Default for ShellOptions {
  fn default() -> Self {
    Self {
      pure: true,
      keep: Vec::new(),
    }
  }
}

/// The complete environment of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ShellEnv {
  vars: BTreeMap<String, String>,
}

impl ShellEnv {
  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }

  pub fn vars(&self) -> &BTreeMap<String, String> {
    &self.vars
  }

  pub fn path_dirs(&self) -> Vec<PathBuf> {
    self
      .get("PATH")
      .map(|p| std::env::split_paths(p).collect())
      .unwrap_or_default()
  }

  /// Finds an executable in the session's `PATH`. Names containing a path
  /// separator are returned as given.
  pub fn which(&self, name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
      return Some(PathBuf::from(name));
    }
    let file = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    self.path_dirs().into_iter().map(|dir| dir.join(&file)).find(|p| p.is_file())
  }
}

/// Assembles a [`ShellEnv`].
///
/// Order of precedence, lowest first: inherited host variables, search
/// paths (`PATH`, `PKG_CONFIG_PATH`, `CMAKE_PREFIX_PATH`), `ENVPIN_SHELL`,
/// extra variables, then declared overrides, which are applied verbatim.
#[derive(Debug, Clone)]
pub struct ShellEnvBuilder {
  name: String,
  options: ShellOptions,
  path: Vec<PathBuf>,
  pkg_config_path: Vec<PathBuf>,
  cmake_prefix_path: Vec<PathBuf>,
  vars: BTreeMap<String, String>,
  overrides: BTreeMap<String, String>,
}

impl ShellEnvBuilder {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      options: ShellOptions::default(),
      path: Vec::new(),
      pkg_config_path: Vec::new(),
      cmake_prefix_path: Vec::new(),
      vars: BTreeMap::new(),
      overrides: BTreeMap::new(),
    }
  }

  pub fn options(mut self, options: &ShellOptions) -> Self {
    self.options = options.clone();
    self
  }

  /// Toolchain `bin` directory; goes first on `PATH`.
  pub fn toolchain(mut self, bin_dir: Option<&Path>) -> Self {
    if let Some(bin) = bin_dir {
      self.path.insert(0, bin.to_path_buf());
    }
    self
  }

  pub fn tools(mut self, tools: &[ResolvedTool]) -> Self {
    self.path.extend(tools.iter().map(|t| t.bin_dir.clone()));
    self
  }

  pub fn libraries(mut self, libraries: &[ResolvedLibrary]) -> Self {
    self.path.extend(libraries.iter().filter_map(|l| l.bin_dir.clone()));
    self
      .pkg_config_path
      .extend(libraries.iter().map(|l| l.pkgconfig_dir.clone()));
    self
      .cmake_prefix_path
      .extend(libraries.iter().map(|l| l.prefix.clone()));
    self
  }

  pub fn var(mut self, name: &str, value: &str) -> Self {
    self.vars.insert(name.to_string(), value.to_string());
    self
  }

  pub fn overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
    self.overrides.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    self
  }

  /// Builds the environment from the given host variables.
  pub fn build<I>(self, host: I) -> Result<ShellEnv, SessionError>
  where
    I: IntoIterator<Item = (String, String)>,
  {
    if let Some(bad) = self
      .options
      .keep
      .iter()
      .chain(self.vars.keys())
      .chain(self.overrides.keys())
      .find(|name| !is_var_name(name))
    {
      return Err(SessionError::InvalidVarName { name: bad.clone() });
    }

    let host: BTreeMap<String, String> = host.into_iter().collect();
    let pure = self.options.pure;

    let mut vars: BTreeMap<String, String> = if pure {
      host
        .iter()
        .filter(|(k, _)| KEEP_VARS.contains(&k.as_str()) || self.options.keep.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
    } else {
      host.clone()
    };

    let inherited = |var: &str| if pure { None } else { host.get(var).map(String::as_str) };
    set_search_path(&mut vars, "PATH", &self.path, inherited("PATH"))?;
    set_search_path(&mut vars, "PKG_CONFIG_PATH", &self.pkg_config_path, inherited("PKG_CONFIG_PATH"))?;
    set_search_path(
      &mut vars,
      "CMAKE_PREFIX_PATH",
      &self.cmake_prefix_path,
      inherited("CMAKE_PREFIX_PATH"),
    )?;

    vars.insert(SHELL_MARKER_VAR.to_string(), self.name);
    vars.extend(self.vars);
    vars.extend(self.overrides);

    Ok(ShellEnv { vars })
  }
}

/// Joins `entries` (deduplicated, first occurrence wins) followed by the
/// inherited value. Leaves the variable unset when there is nothing to put
/// in it.
fn set_search_path(
  vars: &mut BTreeMap<String, String>,
  var: &str,
  entries: &[PathBuf],
  inherited: Option<&str>,
) -> Result<(), SessionError> {
  let mut seen: Vec<&Path> = Vec::new();
  let mut parts: Vec<OsString> = Vec::new();
  for entry in entries {
    if seen.contains(&entry.as_path()) {
      continue;
    }
    seen.push(entry.as_path());
    parts.push(entry.clone().into_os_string());
  }
  if let Some(value) = inherited.filter(|v| !v.is_empty()) {
    parts.push(OsString::from(value));
  }

  if parts.is_empty() {
    vars.remove(var);
    return Ok(());
  }

  let invalid = |entry: String, message: String| SessionError::InvalidPath {
    var: var.to_string(),
    entry,
    message,
  };
  let joined = std::env::join_paths(&parts).map_err(|e| invalid(format!("{parts:?}"), e.to_string()))?;
  let joined = joined
    .into_string()
    .map_err(|raw| invalid(raw.to_string_lossy().to_string(), "not valid UTF-8".to_string()))?;
  vars.insert(var.to_string(), joined);
  Ok(())
}
