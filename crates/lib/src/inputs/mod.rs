//! Descriptor inputs.
//!
//! An input is a named external document (today: a toolchain overlay index)
//! declared in the descriptor's `inputs` table. Its content hash is frozen in
//! the lock file on first fetch and verified on every later evaluation.
//!
//! - [`lock`] - lock file format
//! - [`resolve`] - fetching inputs against the lock

pub mod lock;
pub mod resolve;

use serde::{Deserialize, Serialize};

pub use lock::{LOCK_FILENAME, LockError, LockFile, LockedInput, LockedToolchain};
pub use resolve::{FetchedInput, FetchedInputs, InputError, LockMode, resolve_inputs};

/// An input declaration: either a bare URL or a table with an optional
/// inline hash.
///
/// ```lua
/// inputs = {
///   ["rust-overlay"] = "path:overlay/index.json",
///   mirror = { url = "https://example.org/index.json", sha256 = "9f2c..." },
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputDecl {
  Url(String),
  Pinned {
    url: String,
    #[serde(default)]
    sha256: Option<String>,
  },
}

impl InputDecl {
  pub fn url(&self) -> &str {
    match self {
      InputDecl::Url(url) | InputDecl::Pinned { url, .. } => url,
    }
  }

  /// Hash declared in the descriptor itself, which overrides the lock.
  pub fn sha256(&self) -> Option<&str> {
    match self {
      InputDecl::Url(_) => None,
      InputDecl::Pinned { sha256, .. } => sha256.as_deref(),
    }
  }
}
