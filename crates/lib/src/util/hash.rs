//! Hashing for identities and integrity checks.
//!
//! - `ObjectHash`: truncated hash of a serialized value (package, toolchain
//!   identity, build key); used in store paths.
//! - `ContentHash`: full SHA-256 of bytes, files or directory trees; used to
//!   verify pinned content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// Identity of a serializable value: the first 20 hex characters of the
/// SHA-256 of its JSON form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hash_bytes(serialized.as_bytes());
    Ok(ObjectHash(full.0[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// Full lowercase hex SHA-256 (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl ContentHash {
  /// Compares against a declared hash, ignoring ASCII case.
  pub fn matches(&self, expected: &str) -> bool {
    self.0.eq_ignore_ascii_case(expected)
  }
}

/// Returns true for a 64-character hex string.
pub fn is_sha256_hex(value: &str) -> bool {
  value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("cannot walk source tree: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("cannot read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Hashes a source tree by relative path and content.
///
/// Entries are visited in file-name order and each contributes one record
/// (`D:<rel>`, `F:<rel>:<sha>`, `L:<rel>:<target>`), so timestamps and
/// permissions never affect the result. Names in `exclude` are pruned with
/// everything beneath them.
pub fn hash_directory(root: &Path, exclude: &[&str]) -> Result<ContentHash, DirHashError> {
  let mut tree = Sha256::new();
  let walker = WalkDir::new(root)
    .min_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.file_name().to_str().is_none_or(|name| !exclude.contains(&name)));

  for entry in walker {
    let entry = entry?;
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
    let rel = rel.to_string_lossy().replace('\\', "/");

    let kind = entry.file_type();
    let record = if kind.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(|source| DirHashError::Read {
        path: entry.path().to_path_buf(),
        source,
      })?;
      format!("L:{rel}:{}", target.to_string_lossy())
    } else if kind.is_file() {
      format!("F:{rel}:{}", hash_file(entry.path())?)
    } else if kind.is_dir() {
      format!("D:{rel}")
    } else {
      continue;
    };
    tree.update(record.as_bytes());
    tree.update(b"\n");
  }

  Ok(ContentHash(hex::encode(tree.finalize())))
}

/// Streams a file through SHA-256.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let read_err = |source| DirHashError::Read {
    path: path.to_path_buf(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher).map_err(read_err)?;
  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}
