//! Project descriptors (`envpin.lua`).
//!
//! A descriptor is a Lua script that returns a table:
//!
//! ```lua
//! return {
//!   name = "dbr-sim",
//!   version = "0.1.0",
//!   src = ".",
//!   toolchain = {
//!     dated = { channel = "nightly", date = "2021-03-01", sha256 = "..." },
//!     components = { "rustfmt" },
//!   },
//!   native_build_inputs = { "cmake", "pkg-config" },
//!   build_inputs = { { name = "freetype", pkg_config = "freetype2" }, "fontconfig" },
//!   build = { bin = "dbr-sim" },
//!   shell = { env = { PGDATA = "./db/content" } },
//! }
//! ```
//!
//! Without a `build` table the descriptor only defines a dev shell.

mod lua;
mod types;

pub use lua::load;
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::deps::DependencyError;
use crate::toolchain::ToolchainError;
use crate::util::hash::HashError;

#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("failed to read descriptor '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to evaluate descriptor '{path}': {message}")]
  Eval { path: PathBuf, message: String },

  #[error("invalid descriptor '{path}': {message}")]
  Invalid { path: PathBuf, message: String },

  #[error(transparent)]
  Dependency(#[from] DependencyError),

  #[error(transparent)]
  Toolchain(#[from] ToolchainError),

  #[error("failed to hash package: {0}")]
  Hash(#[from] HashError),
}
