//! Fetching pinned documents with SHA-256 verification.
//!
//! Sources are addressed by URL:
//! - `http://` / `https://` - downloaded with reqwest
//! - `file:///abs/path`, `path:rel/or/abs`, or a bare path - read from disk,
//!   relative paths resolved against the descriptor directory
//!
//! Verified content is cached in a directory keyed by its sha256, so a pinned
//! document is fetched at most once.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::util::hash::{ContentHash, hash_bytes};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to fetch '{url}': {message}")]
  Failed { url: String, message: String },

  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("hash mismatch for '{url}': expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("failed to write cache entry '{path}': {source}")]
  Cache {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Where a URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Http(String),
  File(PathBuf),
}

impl Source {
  pub fn parse(url: &str, base_dir: &Path) -> Self {
    if url.starts_with("http://") || url.starts_with("https://") {
      return Source::Http(url.to_string());
    }
    let raw = url
      .strip_prefix("file://")
      .or_else(|| url.strip_prefix("path:"))
      .unwrap_or(url);
    let path = Path::new(raw);
    if path.is_absolute() {
      Source::File(path.to_path_buf())
    } else {
      Source::File(base_dir.join(path))
    }
  }

  /// Short type name recorded in the lock file.
  pub fn kind(&self) -> &'static str {
    match self {
      Source::Http(_) => "http",
      Source::File(_) => "path",
    }
  }
}

/// Joins a server base (URL or local directory) with a relative path.
pub fn join_url(base: &str, rel: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), rel.trim_start_matches('/'))
}

/// Fetch a URL without verification.
pub async fn fetch_bytes(url: &str, base_dir: &Path) -> Result<Vec<u8>, FetchError> {
  match Source::parse(url, base_dir) {
    Source::Http(url) => {
      info!(url = %url, "fetching URL");
      let failed = |message: String| FetchError::Failed {
        url: url.clone(),
        message,
      };
      let response = reqwest::get(&url).await.map_err(|e| failed(e.to_string()))?;
      if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
      }
      let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
      Ok(bytes.to_vec())
    }
    Source::File(path) => {
      debug!(path = %path.display(), "reading local source");
      fs::read(&path).await.map_err(|source| FetchError::Read { path, source })
    }
  }
}

/// Fetch a URL and verify it against `expected_sha256`.
///
/// A cache hit in `cache_dir` is re-hashed before use; a corrupted entry is
/// discarded and fetched again. A mismatch on fresh content is fatal.
pub async fn fetch_verified(
  url: &str,
  expected_sha256: &str,
  base_dir: &Path,
  cache_dir: &Path,
) -> Result<Vec<u8>, FetchError> {
  let expected = expected_sha256.to_ascii_lowercase();
  let cache_path = cache_dir.join(&expected);

  if let Ok(cached) = fs::read(&cache_path).await {
    if hash_bytes(&cached).matches(&expected) {
      debug!(url, path = %cache_path.display(), "using cached content");
      return Ok(cached);
    }
    debug!(path = %cache_path.display(), "cached content corrupted, refetching");
  }

  let bytes = fetch_bytes(url, base_dir).await?;
  let actual = hash_bytes(&bytes);
  if !actual.matches(&expected) {
    return Err(FetchError::HashMismatch {
      url: url.to_string(),
      expected,
      actual: actual.0,
    });
  }

  store_cached(cache_dir, &actual, &bytes).await?;
  Ok(bytes)
}

/// Writes content into the cache under its hash. The write goes to a
/// temporary name first so a partial entry is never picked up.
pub async fn store_cached(cache_dir: &Path, hash: &ContentHash, bytes: &[u8]) -> Result<PathBuf, FetchError> {
  let dest = cache_dir.join(&hash.0);
  let cache_err = |source| FetchError::Cache {
    path: dest.clone(),
    source,
  };

  fs::create_dir_all(cache_dir).await.map_err(cache_err)?;
  let tmp = cache_dir.join(format!(".{}.tmp-{}", hash.0, std::process::id()));
  let mut file = fs::File::create(&tmp).await.map_err(cache_err)?;
  file.write_all(bytes).await.map_err(cache_err)?;
  file.flush().await.map_err(cache_err)?;
  drop(file);
  fs::rename(&tmp, &dest).await.map_err(cache_err)?;

  Ok(dest)
}
