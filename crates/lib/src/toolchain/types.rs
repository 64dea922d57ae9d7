use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::FetchError;
use crate::util::hash::{Hashable, is_sha256_hex};

/// Release channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Stable,
  Beta,
  Nightly,
}

impl Channel {
  pub fn as_str(&self) -> &'static str {
    match self {
      Channel::Stable => "stable",
      Channel::Beta => "beta",
      Channel::Nightly => "nightly",
    }
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Channel {
  type Err = ToolchainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "stable" => Ok(Channel::Stable),
      "beta" => Ok(Channel::Beta),
      "nightly" => Ok(Channel::Nightly),
      other => Err(ToolchainError::InvalidPin {
        reason: format!("unknown channel '{other}' (expected stable, beta or nightly)"),
      }),
    }
  }
}

/// How the toolchain is pinned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ToolchainPin {
  /// Channel + version through an overlay index input.
  Overlay {
    input: String,
    channel: Channel,
    version: String,
  },
  /// Explicit channel date with the manifest hash.
  Dated {
    channel: Channel,
    date: String,
    sha256: String,
  },
}

/// The toolchain a package is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainSpec {
  pub pin: ToolchainPin,
  #[serde(default)]
  pub components: Vec<String>,
  #[serde(default)]
  pub targets: Vec<String>,
}

impl ToolchainSpec {
  /// Validates the pin's shape. Components and targets are sorted and
  /// deduplicated so their order never affects identity.
  pub fn new(pin: ToolchainPin, mut components: Vec<String>, mut targets: Vec<String>) -> Result<Self, ToolchainError> {
    match &pin {
      ToolchainPin::Dated { channel, date, sha256 } => {
        if *channel == Channel::Stable {
          return Err(ToolchainError::InvalidPin {
            reason: "dated pins select a nightly or beta channel; pin stable through an overlay".to_string(),
          });
        }
        if !is_date(date) {
          return Err(ToolchainError::InvalidPin {
            reason: format!("'{date}' is not a YYYY-MM-DD date"),
          });
        }
        if !is_sha256_hex(sha256) {
          return Err(ToolchainError::InvalidPin {
            reason: format!("'{sha256}' is not a 64-character sha256"),
          });
        }
      }
      ToolchainPin::Overlay { input, version, .. } => {
        if input.is_empty() || version.is_empty() {
          return Err(ToolchainError::InvalidPin {
            reason: "overlay pins need an input name and a version".to_string(),
          });
        }
      }
    }
    components.sort();
    components.dedup();
    targets.sort();
    targets.dedup();
    Ok(Self {
      pin,
      components,
      targets,
    })
  }
}

/// A channel release with the hash its manifest must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedRelease {
  pub channel: Channel,
  /// `YYYY-MM-DD` date or, for stable, a version such as `1.50.0`.
  pub release: String,
  pub sha256: String,
}

impl PinnedRelease {
  /// Toolchain name as understood by rustup: `nightly-2021-03-01`, `1.50.0`.
  pub fn toolchain_name(&self) -> String {
    if is_date(&self.release) {
      format!("{}-{}", self.channel, self.release)
    } else {
      self.release.clone()
    }
  }

  /// Path of the channel manifest relative to the dist server.
  pub fn manifest_path(&self) -> String {
    if is_date(&self.release) {
      format!("dist/{}/channel-rust-{}.toml", self.release, self.channel)
    } else {
      format!("dist/channel-rust-{}.toml", self.release)
    }
  }
}

/// A resolved toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainIdentity {
  pub name: String,
  pub channel: Channel,
  pub release: String,
  pub manifest_sha256: String,
  /// Date recorded in the manifest.
  pub date: String,
  pub rustc: String,
  pub cargo: String,
  pub host: String,
  pub components: Vec<String>,
  pub targets: Vec<String>,
}

impl Hashable for ToolchainIdentity {}

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("invalid toolchain pin: {reason}")]
  InvalidPin { reason: String },

  #[error("toolchain overlay input '{input}' is not declared in inputs")]
  UnknownInput { input: String },

  #[error("invalid overlay index in input '{input}': {message}")]
  OverlayIndex { input: String, message: String },

  #[error("overlay input '{input}' has no channel '{channel}'")]
  UnknownChannel { input: String, channel: Channel },

  #[error("overlay input '{input}' has no {channel} release '{version}'")]
  UnknownRelease {
    input: String,
    channel: Channel,
    version: String,
  },

  #[error("toolchain {toolchain}: manifest hash mismatch: expected {expected}, got {actual}")]
  HashMismatch {
    toolchain: String,
    expected: String,
    actual: String,
  },

  #[error("toolchain {toolchain}: {source}")]
  Fetch {
    toolchain: String,
    #[source]
    source: FetchError,
  },

  #[error("toolchain {toolchain}: invalid channel manifest: {message}")]
  Manifest { toolchain: String, message: String },

  #[error("toolchain {toolchain}: manifest is dated {actual}, pin says {expected}")]
  DateMismatch {
    toolchain: String,
    expected: String,
    actual: String,
  },

  #[error("toolchain {toolchain}: '{package}' is not available for {target}")]
  Unavailable {
    toolchain: String,
    package: String,
    target: String,
  },

  #[error("unsupported host platform")]
  UnsupportedHost,

  #[error("toolchain {toolchain} is not installed in '{dir}' and rustup is disabled")]
  NotInstalled { toolchain: String, dir: String },

  #[error("failed to install toolchain {toolchain}: {message}")]
  Install { toolchain: String, message: String },
}

/// `YYYY-MM-DD` with digits in the right places.
pub fn is_date(value: &str) -> bool {
  let bytes = value.as_bytes();
  bytes.len() == 10
    && bytes.iter().enumerate().all(|(i, b)| match i {
      4 | 7 => *b == b'-',
      _ => b.is_ascii_digit(),
    })
}
