//! Pin → verified manifest → identity.

use std::path::Path;

use tracing::{debug, info, instrument};

use super::manifest::ChannelManifest;
use super::overlay::OverlayIndex;
use super::types::{PinnedRelease, ToolchainError, ToolchainIdentity, ToolchainPin, ToolchainSpec, is_date};
use crate::fetch::{FetchError, fetch_verified, join_url};
use crate::inputs::FetchedInputs;

/// Packages every usable toolchain must ship for the host.
const REQUIRED_PACKAGES: [&str; 3] = ["rustc", "cargo", "rust-std"];

/// Everything toolchain resolution reads besides the spec.
pub struct ResolveContext<'a> {
  /// Dist server base URL or local directory.
  pub dist_server: &'a str,
  /// Directory relative local sources are resolved against.
  pub base_dir: &'a Path,
  /// Cache of verified manifests.
  pub manifests_dir: &'a Path,
  pub inputs: &'a FetchedInputs,
  /// Rust host triple, e.g. `x86_64-unknown-linux-gnu`.
  pub host: &'a str,
}

/// Turns a pin into a pinned release (channel, release, manifest hash).
pub fn pin_release(pin: &ToolchainPin, inputs: &FetchedInputs) -> Result<PinnedRelease, ToolchainError> {
  match pin {
    ToolchainPin::Dated { channel, date, sha256 } => Ok(PinnedRelease {
      channel: *channel,
      release: date.clone(),
      sha256: sha256.to_ascii_lowercase(),
    }),
    ToolchainPin::Overlay { input, channel, version } => {
      let fetched = inputs
        .get(input)
        .ok_or_else(|| ToolchainError::UnknownInput { input: input.clone() })?;
      let index = OverlayIndex::parse(input, &fetched.content)?;
      index.lookup(input, *channel, version)
    }
  }
}

/// Resolves a toolchain spec to a verified identity.
///
/// The channel manifest is fetched from the dist server and its SHA-256
/// compared with the pin; any difference is fatal. The manifest must then
/// match the pinned date and list the required packages, components and
/// targets as available for the host.
#[instrument(skip_all, fields(host = ctx.host))]
pub async fn resolve(spec: &ToolchainSpec, ctx: &ResolveContext<'_>) -> Result<ToolchainIdentity, ToolchainError> {
  let release = pin_release(&spec.pin, ctx.inputs)?;
  let toolchain = release.toolchain_name();
  let url = join_url(ctx.dist_server, &release.manifest_path());
  debug!(toolchain = %toolchain, url = %url, "fetching channel manifest");

  let content = fetch_verified(&url, &release.sha256, ctx.base_dir, ctx.manifests_dir)
    .await
    .map_err(|e| match e {
      FetchError::HashMismatch { expected, actual, .. } => ToolchainError::HashMismatch {
        toolchain: toolchain.clone(),
        expected,
        actual,
      },
      source => ToolchainError::Fetch {
        toolchain: toolchain.clone(),
        source,
      },
    })?;

  let manifest = ChannelManifest::parse(&content).map_err(|message| ToolchainError::Manifest {
    toolchain: toolchain.clone(),
    message,
  })?;

  if is_date(&release.release) && manifest.date != release.release {
    return Err(ToolchainError::DateMismatch {
      toolchain,
      expected: release.release,
      actual: manifest.date,
    });
  }

  let unavailable = |package: &str, target: &str| ToolchainError::Unavailable {
    toolchain: toolchain.clone(),
    package: package.to_string(),
    target: target.to_string(),
  };
  for package in REQUIRED_PACKAGES.iter().copied().chain(spec.components.iter().map(String::as_str)) {
    if !manifest.is_available(package, ctx.host) {
      return Err(unavailable(package, ctx.host));
    }
  }
  for target in &spec.targets {
    if !manifest.is_available("rust-std", target) {
      return Err(unavailable("rust-std", target));
    }
  }

  let version = |package: &str| manifest.version_of(package).unwrap_or_default().to_string();
  let identity = ToolchainIdentity {
    name: toolchain.clone(),
    channel: release.channel,
    release: release.release.clone(),
    manifest_sha256: release.sha256.clone(),
    date: manifest.date.clone(),
    rustc: version("rustc"),
    cargo: version("cargo"),
    host: ctx.host.to_string(),
    components: spec.components.clone(),
    targets: spec.targets.clone(),
  };
  info!(toolchain = %identity.name, rustc = %identity.rustc, "toolchain verified");
  Ok(identity)
}
