//! Base package index.
//!
//! The index is an ordered list of root directories. Each root may hold
//! store-style entries (`/nix/store/<hash>-cmake-3.19.7`, `/opt/pkgs/cmake`)
//! and may itself be an FHS prefix (`/usr`). Nothing outside the roots is
//! consulted, so resolution never depends on the invoking `PATH`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument};

use super::pkgconfig::{self, PkgConfig};
use super::types::{Dependency, DependencyError, DependencySet, Missing, Role};
use crate::util::exe_name;

/// A build-time tool found in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTool {
  pub name: String,
  pub prefix: PathBuf,
  pub bin_dir: PathBuf,
  pub exe: PathBuf,
}

/// A link-time library found in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLibrary {
  pub name: String,
  pub prefix: PathBuf,
  pub pkgconfig_dir: PathBuf,
  pub pc_file: PathBuf,
  pub metadata: PkgConfig,
  /// `bin` of a store-style entry, if it has one. FHS roots never
  /// contribute their `bin`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bin_dir: Option<PathBuf>,
}

/// Everything a package and its dev shell need from the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedDependencies {
  pub tools: Vec<ResolvedTool>,
  pub libraries: Vec<ResolvedLibrary>,
  /// Extra tools requested only by the dev shell.
  pub shell_tools: Vec<ResolvedTool>,
}

impl ResolvedDependencies {
  /// Prefixes of all resolved dependencies, in a stable order.
  pub fn prefixes(&self) -> Vec<&Path> {
    self
      .tools
      .iter()
      .map(|t| t.prefix.as_path())
      .chain(self.libraries.iter().map(|l| l.prefix.as_path()))
      .collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIndex {
  roots: Vec<PathBuf>,
}

struct Candidate {
  prefix: PathBuf,
  store_entry: bool,
}

impl PackageIndex {
  pub fn new(roots: Vec<PathBuf>) -> Self {
    Self { roots }
  }

  /// Roots used when neither the environment nor the descriptor name any.
  pub fn default_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
      Vec::new()
    } else {
      vec![PathBuf::from("/usr/local"), PathBuf::from("/usr")]
    }
  }

  pub fn roots(&self) -> &[PathBuf] {
    &self.roots
  }

  pub fn resolve_tool(&self, dep: &Dependency) -> Option<ResolvedTool> {
    let file = exe_name(dep.exe_name());
    self.candidates(&dep.name).into_iter().find_map(|c| {
      let bin_dir = c.prefix.join("bin");
      let exe = bin_dir.join(&file);
      exe.is_file().then(|| ResolvedTool {
        name: dep.name.clone(),
        prefix: c.prefix,
        bin_dir,
        exe,
      })
    })
  }

  pub fn resolve_library(&self, dep: &Dependency) -> Result<Option<ResolvedLibrary>, DependencyError> {
    let pc_name = format!("{}.pc", dep.pc_name());
    for candidate in self.candidates(&dep.name) {
      for pkgconfig_dir in pkgconfig_dirs(&candidate.prefix) {
        let pc_file = pkgconfig_dir.join(&pc_name);
        if !pc_file.is_file() {
          continue;
        }
        let invalid = |message: String| DependencyError::PkgConfig {
          path: pc_file.clone(),
          message,
        };
        let content = fs::read_to_string(&pc_file).map_err(|e| invalid(e.to_string()))?;
        let metadata = pkgconfig::parse(&content).map_err(invalid)?;
        let bin_dir = Some(candidate.prefix.join("bin")).filter(|b| candidate.store_entry && b.is_dir());

        return Ok(Some(ResolvedLibrary {
          name: dep.name.clone(),
          prefix: candidate.prefix,
          pkgconfig_dir,
          pc_file,
          metadata,
          bin_dir,
        }));
      }
    }
    Ok(None)
  }

  /// Store-style entries matching `name` in every root, newest version first,
  /// followed by the root itself.
  fn candidates(&self, name: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    for root in &self.roots {
      let mut entries: Vec<(String, PathBuf)> = fs::read_dir(root)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
          let file_name = entry.file_name().to_str()?.to_string();
          let rest = entry_matches(&file_name, name)?;
          Some((rest.to_string(), entry.path()))
        })
        .filter(|(_, path)| path.is_dir())
        .collect();
      entries.sort_by(|a, b| version_cmp(&b.0, &a.0).then_with(|| a.1.cmp(&b.1)));

      out.extend(entries.into_iter().map(|(_, prefix)| Candidate {
        prefix,
        store_entry: true,
      }));
      out.push(Candidate {
        prefix: root.clone(),
        store_entry: false,
      });
    }
    out
  }
}

/// Matches a directory name against a dependency name and returns the part
/// used for ordering (the name without a store hash).
///
/// Accepted: `name`, `name-<version>[-<output>]` and
/// `<32-char hash>-name[-<version>...]`. The version must start with a digit
/// so `pkg-config` does not match `pkg-config-wrapper`.
fn entry_matches<'a>(entry: &'a str, name: &str) -> Option<&'a str> {
  let rest = match entry.split_once('-') {
    Some((hash, rest)) if hash.len() == 32 && hash.bytes().all(|b| b.is_ascii_alphanumeric()) => rest,
    _ => entry,
  };
  if rest == name {
    return Some(rest);
  }
  let version = rest.strip_prefix(name)?.strip_prefix('-')?;
  version.starts_with(|c: char| c.is_ascii_digit()).then_some(rest)
}

/// Orders entry names with digit runs compared as numbers, so
/// `cmake-3.19.7` sorts after `cmake-3.9.6`.
fn version_cmp(a: &str, b: &str) -> Ordering {
  let (mut a, mut b) = (a, b);
  loop {
    match (a.chars().next(), b.chars().next()) {
      (None, None) => return Ordering::Equal,
      (None, Some(_)) => return Ordering::Less,
      (Some(_), None) => return Ordering::Greater,
      (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
        let (num_a, rest_a) = split_digits(a);
        let (num_b, rest_b) = split_digits(b);
        let (trim_a, trim_b) = (num_a.trim_start_matches('0'), num_b.trim_start_matches('0'));
        let ord = trim_a.len().cmp(&trim_b.len()).then_with(|| trim_a.cmp(trim_b));
        if ord != Ordering::Equal {
          return ord;
        }
        (a, b) = (rest_a, rest_b);
      }
      (Some(x), Some(y)) => {
        if x != y {
          return x.cmp(&y);
        }
        (a, b) = (&a[x.len_utf8()..], &b[y.len_utf8()..]);
      }
    }
  }
}

fn split_digits(s: &str) -> (&str, &str) {
  let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
  s.split_at(end)
}

fn pkgconfig_dirs(prefix: &Path) -> Vec<PathBuf> {
  let mut dirs = vec![
    prefix.join("lib").join("pkgconfig"),
    prefix.join("lib64").join("pkgconfig"),
    prefix.join("share").join("pkgconfig"),
  ];
  // Multiarch layouts: lib/x86_64-linux-gnu/pkgconfig
  let mut multiarch: Vec<PathBuf> = fs::read_dir(prefix.join("lib"))
    .into_iter()
    .flatten()
    .flatten()
    .map(|e| e.path().join("pkgconfig"))
    .filter(|p| p.is_dir())
    .collect();
  multiarch.sort();
  dirs.extend(multiarch);
  dirs
}

/// Resolves every dependency of `set` plus the dev shell's extra tools.
///
/// All lookups run before failing so that the error names every missing
/// dependency at once.
#[instrument(skip_all, fields(roots = index.roots().len()))]
pub fn resolve(
  set: &DependencySet,
  shell_tools: &[Dependency],
  index: &PackageIndex,
) -> Result<ResolvedDependencies, DependencyError> {
  let mut resolved = ResolvedDependencies::default();
  let mut missing = Vec::new();

  let tool = |dep: &Dependency, out: &mut Vec<ResolvedTool>, missing: &mut Vec<Missing>| match index.resolve_tool(dep) {
    Some(found) => {
      debug!(name = %dep.name, exe = %found.exe.display(), "resolved tool");
      out.push(found);
    }
    None => missing.push(Missing {
      name: dep.name.clone(),
      role: Role::Tool,
      wanted: format!("bin/{}", dep.exe_name()),
      invalid: None,
    }),
  };

  for dep in &set.native_build_inputs {
    tool(dep, &mut resolved.tools, &mut missing);
  }
  for dep in shell_tools {
    tool(dep, &mut resolved.shell_tools, &mut missing);
  }

  // A malformed .pc file is reported with the missing names rather than
  // cutting the scan short.
  for dep in &set.build_inputs {
    match index.resolve_library(dep) {
      Ok(Some(found)) => {
        debug!(name = %dep.name, pc = %found.pc_file.display(), version = %found.metadata.version, "resolved library");
        resolved.libraries.push(found);
      }
      Ok(None) => missing.push(Missing {
        name: dep.name.clone(),
        role: Role::Library,
        wanted: format!("{}.pc", dep.pc_name()),
        invalid: None,
      }),
      Err(DependencyError::PkgConfig { path, message }) => missing.push(Missing {
        name: dep.name.clone(),
        role: Role::Library,
        wanted: path.display().to_string(),
        invalid: Some(message),
      }),
      Err(other) => return Err(other),
    }
  }

  if !missing.is_empty() {
    return Err(DependencyError::Unresolved {
      missing,
      roots: index.roots().to_vec(),
    });
  }
  Ok(resolved)
}
