use std::fs;
use std::path::Path;

use mlua::prelude::*;
use tracing::debug;

use super::{Descriptor, DescriptorDecl, DescriptorError};
use crate::platform::Platform;

/// Creates the Lua state descriptors run in.
///
/// The `envpin` global exposes:
/// - `envpin.dir` - directory of the descriptor
/// - `envpin.platform`, `envpin.os`, `envpin.arch` - host platform
/// - `envpin.getenv(name)` - read a variable of the invoking environment
fn create_runtime(dir: &Path) -> LuaResult<Lua> {
  let lua = Lua::new();

  let package: LuaTable = lua.globals().get("package")?;
  let package_path: String = package.get("path")?;
  let dir_str = dir.to_string_lossy();
  package.set(
    "path",
    format!("{dir_str}/?.lua;{dir_str}/lua/?.lua;{dir_str}/lua/?/init.lua;{package_path}"),
  )?;

  let platform = Platform::current().ok_or_else(|| LuaError::external("unsupported platform"))?;
  let envpin = lua.create_table()?;
  envpin.set("dir", dir_str.to_string())?;
  envpin.set("platform", platform.triple())?;
  envpin.set("os", platform.os)?;
  envpin.set("arch", platform.arch)?;
  envpin.set(
    "getenv",
    lua.create_function(|_, name: String| Ok(std::env::var(name).ok()))?,
  )?;
  lua.globals().set("envpin", envpin)?;

  Ok(lua)
}

/// Evaluates the descriptor at `path` and deserializes the returned table.
pub fn load(path: &Path) -> Result<Descriptor, DescriptorError> {
  let canonical = dunce::canonicalize(path).map_err(|source| DescriptorError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let content = fs::read_to_string(&canonical).map_err(|source| DescriptorError::Read {
    path: canonical.clone(),
    source,
  })?;
  let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

  let eval_err = |e: LuaError| DescriptorError::Eval {
    path: canonical.clone(),
    message: e.to_string(),
  };

  let lua = create_runtime(&dir).map_err(eval_err)?;
  let value = lua
    .load(&content)
    .set_name(format!("@{}", canonical.display()))
    .eval::<LuaValue>()
    .map_err(eval_err)?;

  if !value.is_table() {
    return Err(DescriptorError::Invalid {
      path: canonical,
      message: format!("descriptor must return a table, got {}", value.type_name()),
    });
  }

  let decl: DescriptorDecl = lua.from_value(value).map_err(|e| DescriptorError::Invalid {
    path: canonical.clone(),
    message: e.to_string(),
  })?;
  debug!(path = %canonical.display(), name = %decl.name, "loaded descriptor");

  Ok(Descriptor {
    path: canonical,
    dir,
    decl,
  })
}
