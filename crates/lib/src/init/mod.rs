//! Scaffold a descriptor in a project directory.
//!
//! Writes:
//! - `envpin.lua` - a shell-only descriptor named after the directory
//! - `.luarc.json` and `.envpin/types/envpin.d.lua` for LuaLS completion

mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::DESCRIPTOR_FILENAME;

pub use templates::{DESCRIPTOR_TEMPLATE, LUARC_JSON_TEMPLATE, TYPES_D_LUA};

#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },
}

#[derive(Debug)]
pub struct InitResult {
  pub dir: PathBuf,
  pub name: String,
  pub descriptor: PathBuf,
  /// `None` when a `.luarc.json` already existed and was left alone.
  pub luarc_json: Option<PathBuf>,
}

/// Writes a template descriptor into `dir`, creating it if needed.
///
/// Refuses to overwrite an existing `envpin.lua`.
pub fn init_descriptor(dir: &Path) -> Result<InitResult, InitError> {
  fs::create_dir_all(dir).map_err(|source| InitError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;
  let dir = dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

  let descriptor = dir.join(DESCRIPTOR_FILENAME);
  if descriptor.exists() {
    return Err(InitError::PathExists { path: descriptor });
  }

  let name = project_name(&dir);
  write(&descriptor, &DESCRIPTOR_TEMPLATE.replace("{name}", &name))?;

  let types_dir = dir.join(".envpin").join("types");
  fs::create_dir_all(&types_dir).map_err(|source| InitError::CreateDir {
    path: types_dir.clone(),
    source,
  })?;
  write(&types_dir.join("envpin.d.lua"), TYPES_D_LUA)?;

  let luarc = dir.join(".luarc.json");
  let luarc_json = if luarc.exists() {
    None
  } else {
    write(&luarc, LUARC_JSON_TEMPLATE)?;
    Some(luarc)
  };

  Ok(InitResult {
    dir,
    name,
    descriptor,
    luarc_json,
  })
}

fn write(path: &Path, content: &str) -> Result<(), InitError> {
  fs::write(path, content).map_err(|source| InitError::WriteFile {
    path: path.to_path_buf(),
    source,
  })
}

/// Directory name reduced to the characters package names allow.
fn project_name(dir: &Path) -> String {
  let raw = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();
  let name: String = raw
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') { c } else { '-' })
    .collect();
  let name = name.trim_matches('-');
  if name.is_empty() { "project".to_string() } else { name.to_string() }
}
