//! Lock file management.
//!
//! The lock file (`envpin.lock`) freezes the content hash of every declared
//! input and records which toolchain the descriptor resolved to. It lives
//! next to the descriptor.
//!
//! Written as pretty JSON through a temporary sibling and a rename, so a
//! crash never leaves a truncated lock behind:
//!
//! ```json
//! {
//!   "version": 1,
//!   "inputs": {
//!     "rust-overlay": {
//!       "type": "http",
//!       "url": "https://example.org/rust-overlay/index.json",
//!       "sha256": "9f2c...",
//!       "lastModified": 1733667300
//!     }
//!   },
//!   "toolchain": {
//!     "name": "nightly-2021-03-01",
//!     "channel": "nightly",
//!     "release": "2021-03-01",
//!     "sha256": "5b1c..."
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::toolchain::ToolchainIdentity;

pub const LOCK_VERSION: u32 = 1;

pub const LOCK_FILENAME: &str = "envpin.lock";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
  pub version: u32,
  #[serde(default)]
  pub inputs: BTreeMap<String, LockedInput>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub toolchain: Option<LockedToolchain>,
}

/// A frozen input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedInput {
  /// `http` or `path`.
  #[serde(rename = "type")]
  pub type_: String,
  pub url: String,
  pub sha256: String,
  /// Unix time the content was first locked.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_modified: Option<u64>,
}

/// The toolchain a descriptor resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedToolchain {
  pub name: String,
  pub channel: String,
  pub release: String,
  /// SHA-256 of the channel manifest.
  pub sha256: String,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error("cannot read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("cannot write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("{path} is not a valid lock file: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("cannot encode lock file: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("{path} has lock format version {found}; this envpin reads version {LOCK_VERSION}")]
  UnsupportedVersion { path: PathBuf, found: u32 },
}

impl Default for LockFile {
  fn default() -> Self {
    Self::new()
  }
}

impl LockFile {
  pub fn new() -> Self {
    Self {
      version: LOCK_VERSION,
      inputs: BTreeMap::new(),
      toolchain: None,
    }
  }

  /// Reads `path`, or `None` when there is no lock yet.
  pub fn load(path: &Path) -> Result<Option<Self>, LockError> {
    let bytes = match fs::read(path) {
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      other => other.map_err(|source| LockError::Read {
        path: path.to_path_buf(),
        source,
      })?,
    };

    let lock: LockFile = serde_json::from_slice(&bytes).map_err(|source| LockError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    if lock.version != LOCK_VERSION {
      return Err(LockError::UnsupportedVersion {
        path: path.to_path_buf(),
        found: lock.version,
      });
    }
    Ok(Some(lock))
  }

  pub fn save(&self, path: &Path) -> Result<(), LockError> {
    let mut json = serde_json::to_vec_pretty(self).map_err(LockError::Serialize)?;
    json.push(b'\n');

    let write_err = |source| LockError::Write {
      path: path.to_path_buf(),
      source,
    };
    let tmp = path.with_extension(format!("lock.tmp-{}", std::process::id()));
    fs::write(&tmp, &json).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(|e| {
      let _ = fs::remove_file(&tmp);
      write_err(e)
    })
  }

  pub fn get(&self, name: &str) -> Option<&LockedInput> {
    self.inputs.get(name)
  }

  pub fn insert(&mut self, name: String, input: LockedInput) {
    self.inputs.insert(name, input);
  }

  /// True when the lock pins nothing; an empty lock is never written.
  pub fn is_empty(&self) -> bool {
    self.inputs.is_empty() && self.toolchain.is_none()
  }
}

impl LockedInput {
  pub fn new(type_: &str, url: &str, sha256: &str) -> Self {
    Self {
      type_: type_.into(),
      url: url.into(),
      sha256: sha256.into(),
      last_modified: None,
    }
  }

  pub fn with_last_modified(self, timestamp: u64) -> Self {
    Self {
      last_modified: Some(timestamp),
      ..self
    }
  }
}

impl From<&ToolchainIdentity> for LockedToolchain {
  fn from(identity: &ToolchainIdentity) -> Self {
    Self {
      name: identity.name.clone(),
      channel: identity.channel.to_string(),
      release: identity.release.clone(),
      sha256: identity.manifest_sha256.clone(),
    }
  }
}
