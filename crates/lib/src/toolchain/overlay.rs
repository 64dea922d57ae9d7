//! Overlay index documents.
//!
//! ```json
//! {
//!   "version": 1,
//!   "channels": {
//!     "nightly": {
//!       "latest": "2021-03-01",
//!       "releases": { "2021-03-01": "<manifest sha256>" }
//!     }
//!   }
//! }
//! ```
//!
//! `latest` moves only when the overlay input is updated, which changes the
//! input's locked hash.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{Channel, PinnedRelease, ToolchainError, is_date};
use crate::util::hash::is_sha256_hex;

pub const OVERLAY_INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayIndex {
  pub version: u32,
  pub channels: BTreeMap<Channel, OverlayChannel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayChannel {
  pub latest: String,
  pub releases: BTreeMap<String, String>,
}

impl OverlayIndex {
  pub fn parse(input: &str, content: &[u8]) -> Result<Self, ToolchainError> {
    let invalid = |message: String| ToolchainError::OverlayIndex {
      input: input.to_string(),
      message,
    };

    let index: OverlayIndex = serde_json::from_slice(content).map_err(|e| invalid(e.to_string()))?;
    if index.version != OVERLAY_INDEX_VERSION {
      return Err(invalid(format!(
        "unsupported version {}, expected {OVERLAY_INDEX_VERSION}",
        index.version
      )));
    }
    for (channel, entry) in &index.channels {
      if !entry.releases.contains_key(&entry.latest) {
        return Err(invalid(format!("{channel}: latest release '{}' is not listed", entry.latest)));
      }
      for (release, sha256) in &entry.releases {
        if !is_sha256_hex(sha256) {
          return Err(invalid(format!("{channel} {release}: '{sha256}' is not a sha256")));
        }
        if *channel != Channel::Stable && !is_date(release) {
          return Err(invalid(format!("{channel}: release '{release}' is not a date")));
        }
      }
    }
    Ok(index)
  }

  /// Looks up `version` (`latest` or an explicit release) on `channel`.
  pub fn lookup(&self, input: &str, channel: Channel, version: &str) -> Result<PinnedRelease, ToolchainError> {
    let entry = self.channels.get(&channel).ok_or_else(|| ToolchainError::UnknownChannel {
      input: input.to_string(),
      channel,
    })?;

    let release = if version == "latest" { entry.latest.as_str() } else { version };
    let sha256 = entry.releases.get(release).ok_or_else(|| ToolchainError::UnknownRelease {
      input: input.to_string(),
      channel,
      version: version.to_string(),
    })?;

    Ok(PinnedRelease {
      channel,
      release: release.to_string(),
      sha256: sha256.to_ascii_lowercase(),
    })
  }
}
