//! Host detection.
//!
//! Channel manifests list per-host packages under the Rust target triple
//! (`x86_64-unknown-linux-gnu`). Descriptors see the shorter `<arch>-<os>`
//! form (`x86_64-linux`, `aarch64-darwin`).

pub mod paths;

use std::fmt;

/// `(std arch, std os, descriptor os, triple suffix)` for every host a
/// toolchain can be pinned on.
const HOSTS: &[(&str, &str, &str, &str)] = &[
  ("x86_64", "linux", "linux", "unknown-linux-gnu"),
  ("aarch64", "linux", "linux", "unknown-linux-gnu"),
  ("x86_64", "macos", "darwin", "apple-darwin"),
  ("aarch64", "macos", "darwin", "apple-darwin"),
  ("x86_64", "windows", "windows", "pc-windows-msvc"),
  ("aarch64", "windows", "windows", "pc-windows-msvc"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: &'static str,
  pub os: &'static str,
  suffix: &'static str,
}

impl Platform {
  /// Looks up a host by its `std::env::consts` names.
  pub fn detect(arch: &str, os: &str) -> Option<Self> {
    HOSTS
      .iter()
      .find(|(a, o, _, _)| *a == arch && *o == os)
      .map(|&(arch, _, os, suffix)| Self { arch, os, suffix })
  }

  /// The host this binary runs on, `None` when no toolchain can be pinned for it.
  pub fn current() -> Option<Self> {
    let mut platform = Self::detect(std::env::consts::ARCH, std::env::consts::OS)?;
    if cfg!(target_env = "musl") {
      platform.suffix = "unknown-linux-musl";
    }
    Some(platform)
  }

  /// Short form exposed to descriptors.
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }

  /// Key under which channel manifests list this host's packages.
  pub fn rust_host(&self) -> String {
    format!("{}-{}", self.arch, self.suffix)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.triple())
  }
}

pub fn platform_triple() -> Option<String> {
  Platform::current().map(|p| p.triple())
}

pub fn rust_host() -> Option<String> {
  Platform::current().map(|p| p.rust_host())
}
