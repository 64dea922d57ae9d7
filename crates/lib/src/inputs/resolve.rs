//! Fetching inputs against the lock file.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, info, instrument};

use super::InputDecl;
use super::lock::{LockFile, LockedInput};
use crate::fetch::{FetchError, Source, fetch_bytes, fetch_verified, store_cached};
use crate::util::hash::hash_bytes;

#[derive(Debug, Error)]
pub enum InputError {
  #[error("input '{input}': {source}")]
  Fetch {
    input: String,
    #[source]
    source: FetchError,
  },

  #[error("input '{input}' changed: locked sha256 {expected}, fetched {actual}")]
  HashMismatch {
    input: String,
    expected: String,
    actual: String,
  },

  #[error("input '{input}' is not locked (run without --locked, or `envpin update`)")]
  NotLocked { input: String },

  #[error("unknown input '{input}'")]
  Unknown { input: String },
}

/// How the existing lock is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockMode {
  /// Verify locked inputs, lock new ones.
  Use,
  /// Verify locked inputs and fail on anything unlocked.
  Frozen,
  /// Re-fetch the named inputs (all when empty) ignoring their locked hash.
  Refresh(Vec<String>),
}

impl LockMode {
  fn refreshes(&self, name: &str) -> bool {
    match self {
      LockMode::Refresh(names) => names.is_empty() || names.iter().any(|n| n == name),
      _ => false,
    }
  }
}

/// A fetched, verified input document.
#[derive(Debug, Clone)]
pub struct FetchedInput {
  pub name: String,
  pub content: Vec<u8>,
  pub locked: LockedInput,
}

pub type FetchedInputs = BTreeMap<String, FetchedInput>;

/// Resolves every declared input.
///
/// Locked entries with an unchanged URL are verified against their locked
/// hash; a mismatch is fatal. Unlocked entries (or ones whose URL changed)
/// are fetched and their hash recorded, unless `mode` is
/// [`LockMode::Frozen`].
#[instrument(skip_all, fields(inputs = decls.len()))]
pub async fn resolve_inputs(
  decls: &BTreeMap<String, InputDecl>,
  lock: &LockFile,
  mode: &LockMode,
  base_dir: &Path,
  cache_dir: &Path,
) -> Result<FetchedInputs, InputError> {
  if let LockMode::Refresh(names) = mode
    && let Some(unknown) = names.iter().find(|n| !decls.contains_key(*n))
  {
    return Err(InputError::Unknown { input: unknown.clone() });
  }

  let mut fetched = FetchedInputs::new();
  for (name, decl) in decls {
    let input = resolve_input(name, decl, lock, mode, base_dir, cache_dir).await?;
    fetched.insert(name.clone(), input);
  }
  Ok(fetched)
}

/// Resolves a single input.
pub async fn resolve_input(
  name: &str,
  decl: &InputDecl,
  lock: &LockFile,
  mode: &LockMode,
  base_dir: &Path,
  cache_dir: &Path,
) -> Result<FetchedInput, InputError> {
  let url = decl.url();
  let fetch_err = |source| InputError::Fetch {
    input: name.to_string(),
    source,
  };

  let locked = lock.get(name).filter(|l| l.url == url && !mode.refreshes(name));
  let pinned = decl.sha256().map(str::to_string).or_else(|| locked.map(|l| l.sha256.clone()));

  if let Some(expected) = pinned {
    debug!(input = name, sha256 = %expected, "verifying pinned input");
    let content = fetch_verified(url, &expected, base_dir, cache_dir)
      .await
      .map_err(|e| match e {
        FetchError::HashMismatch { expected, actual, .. } => InputError::HashMismatch {
          input: name.to_string(),
          expected,
          actual,
        },
        other => fetch_err(other),
      })?;

    let entry = match locked {
      Some(l) if l.sha256.eq_ignore_ascii_case(&expected) => l.clone(),
      _ => {
        if *mode == LockMode::Frozen {
          return Err(InputError::NotLocked { input: name.to_string() });
        }
        new_entry(url, &expected.to_ascii_lowercase(), base_dir)
      }
    };
    return Ok(FetchedInput {
      name: name.to_string(),
      content,
      locked: entry,
    });
  }

  if *mode == LockMode::Frozen {
    return Err(InputError::NotLocked { input: name.to_string() });
  }

  let content = fetch_bytes(url, base_dir).await.map_err(fetch_err)?;
  let hash = hash_bytes(&content);
  store_cached(cache_dir, &hash, &content).await.map_err(fetch_err)?;

  // A refresh that finds the same content keeps the existing entry.
  let entry = match lock.get(name) {
    Some(prev) if prev.url == url && hash.matches(&prev.sha256) => prev.clone(),
    _ => {
      info!(input = name, sha256 = %hash, "locked input");
      new_entry(url, &hash.0, base_dir)
    }
  };

  Ok(FetchedInput {
    name: name.to_string(),
    content,
    locked: entry,
  })
}

fn new_entry(url: &str, sha256: &str, base_dir: &Path) -> LockedInput {
  let now = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or(0);
  LockedInput::new(Source::parse(url, base_dir).kind(), url, sha256).with_last_modified(now)
}
