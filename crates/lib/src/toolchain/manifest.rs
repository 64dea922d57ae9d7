//! Rust channel manifests (`channel-rust-*.toml`, manifest version 2).

use std::collections::BTreeMap;

use serde::Deserialize;

/// The subset of a channel manifest needed to validate a toolchain.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelManifest {
  #[serde(rename = "manifest-version")]
  pub manifest_version: String,
  pub date: String,
  #[serde(default)]
  pub pkg: BTreeMap<String, ManifestPackage>,
  #[serde(default)]
  pub renames: BTreeMap<String, Rename>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestPackage {
  #[serde(default)]
  pub version: String,
  #[serde(default)]
  pub target: BTreeMap<String, ManifestTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestTarget {
  #[serde(default)]
  pub available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rename {
  pub to: String,
}

impl ChannelManifest {
  /// Parses and checks the manifest version.
  pub fn parse(content: &[u8]) -> Result<Self, String> {
    let text = std::str::from_utf8(content).map_err(|e| e.to_string())?;
    let manifest: ChannelManifest = toml::from_str(text).map_err(|e| e.to_string())?;
    if manifest.manifest_version != "2" {
      return Err(format!("unsupported manifest-version '{}'", manifest.manifest_version));
    }
    Ok(manifest)
  }

  /// Follows `renames` (`rustfmt` → `rustfmt-preview` on older channels).
  pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
    self.renames.get(name).map(|r| r.to.as_str()).unwrap_or(name)
  }

  pub fn version_of(&self, name: &str) -> Option<&str> {
    self.pkg.get(self.canonical_name(name)).map(|p| p.version.as_str())
  }

  /// Whether `name` is available for `target`. Target-independent packages
  /// are listed under `*`.
  pub fn is_available(&self, name: &str, target: &str) -> bool {
    self
      .pkg
      .get(self.canonical_name(name))
      .and_then(|p| p.target.get(target).or_else(|| p.target.get("*")))
      .is_some_and(|t| t.available)
  }
}
