//! Test helpers for envpin-lib.
//!
//! Builds fake package-index prefixes, fake toolchains and dist servers in
//! temporary directories so resolution can be exercised without a network.

use std::fs;
use std::path::{Path, PathBuf};

use crate::util::hash::hash_bytes;

/// Writes an executable file (a shell script on Unix).
pub fn write_executable(path: &Path, script: &str) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, script).unwrap();
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
  }
}

/// Creates `<root>/<entry>/bin/<exe>`.
pub fn fake_tool(root: &Path, entry: &str, exe: &str) -> PathBuf {
  let prefix = root.join(entry);
  write_executable(&prefix.join("bin").join(exe), "#!/bin/sh\nexit 0\n");
  prefix
}

/// Creates `<root>/<entry>/lib/pkgconfig/<pc>.pc` with a minimal body.
pub fn fake_library(root: &Path, entry: &str, pc: &str, version: &str) -> PathBuf {
  let prefix = root.join(entry);
  let pc_dir = prefix.join("lib").join("pkgconfig");
  fs::create_dir_all(&pc_dir).unwrap();
  let body = format!(
    "prefix={}\nlibdir=${{prefix}}/lib\nincludedir=${{prefix}}/include\n\nName: {pc}\nDescription: test library\nVersion: {version}\nLibs: -L${{libdir}} -l{pc}\nCflags: -I${{includedir}}\n",
    prefix.display()
  );
  fs::write(pc_dir.join(format!("{pc}.pc")), body).unwrap();
  prefix
}

/// A channel manifest in the dist server format, listing rustc, cargo and
/// rust-std for `host`.
pub fn channel_manifest(date: &str, host: &str) -> String {
  format!(
    r#"manifest-version = "2"
date = "{date}"

[pkg.rustc]
version = "1.52.0-nightly (0f6f2d681 {date})"

[pkg.rustc.target.{host}]
available = true

[pkg.cargo]
version = "1.52.0-nightly (c68432f1e {date})"

[pkg.cargo.target.{host}]
available = true

[pkg.rust-std]
version = "1.52.0-nightly (0f6f2d681 {date})"

[pkg.rust-std.target.{host}]
available = true

[pkg.rust-std.target.wasm32-unknown-unknown]
available = true

[pkg.rustfmt-preview]
version = "1.4.36-nightly (7de6968e {date})"

[pkg.rustfmt-preview.target.{host}]
available = true

[pkg.clippy-preview]
version = "0.1.52-nightly"

[pkg.clippy-preview.target.{host}]
available = false

[renames.rustfmt]
to = "rustfmt-preview"

[renames.clippy]
to = "clippy-preview"
"#
  )
}

/// Writes a nightly manifest into a local dist server and returns its sha256.
pub fn publish_nightly(dist_root: &Path, date: &str, host: &str) -> String {
  let dir = dist_root.join("dist").join(date);
  fs::create_dir_all(&dir).unwrap();
  let body = channel_manifest(date, host);
  fs::write(dir.join("channel-rust-nightly.toml"), &body).unwrap();
  hash_bytes(body.as_bytes()).0
}

/// Creates `<toolchains>/<name>/bin/{cargo,rustc}`.
pub fn fake_toolchain(toolchains: &Path, name: &str) -> PathBuf {
  let bin = toolchains.join(name).join("bin");
  write_executable(&bin.join("cargo"), "#!/bin/sh\nexit 0\n");
  write_executable(&bin.join("rustc"), "#!/bin/sh\nexit 0\n");
  bin
}
