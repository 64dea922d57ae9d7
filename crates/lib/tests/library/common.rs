//! Shared fixtures for library integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use envpin_lib::config::Settings;
use envpin_lib::platform;
use envpin_lib::util::hash::hash_bytes;
use tempfile::TempDir;

/// Flake-style descriptor with a dated nightly pin. `@SHA@` and `@ENV@` are
/// substituted by [`flake_dated`].
const FLAKE_DATED: &str = r#"
return {
  name = "dbr-sim",
  version = "0.1.0",
  toolchain = {
    dated = { channel = "nightly", date = "2021-03-01", sha256 = "@SHA@" },
  },
  native_build_inputs = { "cmake", "pkg-config" },
  build_inputs = { { name = "freetype", pkg_config = "freetype2" }, "fontconfig" },
  build = { bin = "dbr-sim" },
  app = { args = { "--headless" } },
  shell = { env = { @ENV@ } },
}
"#;

/// Flake-style descriptor pinned through an overlay index input.
pub const FLAKE_OVERLAY: &str = r#"
return {
  name = "dbr-sim",
  inputs = { ["rust-overlay"] = "path:overlay/index.json" },
  toolchain = {
    overlay = { input = "rust-overlay", channel = "nightly" },
  },
  native_build_inputs = { "cmake", "pkg-config" },
  build_inputs = { { name = "freetype", pkg_config = "freetype2" }, "fontconfig" },
  build = { bin = "dbr-sim" },
}
"#;

/// Shell-only descriptor, optionally declaring PGDATA.
pub fn shell_only(with_pgdata: bool) -> String {
  let env = if with_pgdata { r#"PGDATA = "./db/content""# } else { "" };
  format!(
    r#"
return {{
  name = "dbr-sim",
  native_build_inputs = {{ "cmake", "pkg-config" }},
  build_inputs = {{ {{ name = "freetype", pkg_config = "freetype2" }}, "fontconfig" }},
  shell = {{ env = {{ {env} }} }},
}}
"#
  )
}

pub fn flake_dated(sha256: &str, with_pgdata: bool) -> String {
  let env = if with_pgdata { r#"PGDATA = "./db/content""# } else { "" };
  FLAKE_DATED.replace("@SHA@", sha256).replace("@ENV@", env)
}

/// An isolated project with its own store, toolchains, dist server and
/// package index.
pub struct TestProject {
  _temp: TempDir,
  pub root: PathBuf,
  pub index_root: PathBuf,
  pub dist: PathBuf,
  pub settings: Settings,
  pub host: String,
}

impl TestProject {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let base = dunce::canonicalize(temp.path()).unwrap();
    let root = base.join("project");
    let index_root = base.join("pkgs");
    let dist = base.join("dist-server");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(&index_root).unwrap();

    let settings = Settings {
      store_dir: base.join("store"),
      toolchains_dir: base.join("toolchains"),
      dist_server: dist.to_string_lossy().to_string(),
      index_roots: Some(vec![index_root.clone()]),
      use_rustup: false,
    };

    Self {
      _temp: temp,
      root,
      index_root,
      dist,
      settings,
      host: platform::rust_host().unwrap(),
    }
  }

  pub fn descriptor_path(&self) -> PathBuf {
    self.root.join("envpin.lua")
  }

  pub fn lock_path(&self) -> PathBuf {
    self.root.join("envpin.lock")
  }

  pub fn write_descriptor(&self, body: &str) -> PathBuf {
    let path = self.descriptor_path();
    fs::write(&path, body).unwrap();
    path
  }

  /// Publishes a nightly channel manifest and returns its sha256.
  pub fn publish_nightly(&self, date: &str) -> String {
    let body = channel_manifest(date, &self.host);
    let dir = self.dist.join("dist").join(date);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("channel-rust-nightly.toml"), &body).unwrap();
    hash_bytes(body.as_bytes()).0
  }

  /// Writes `overlay/index.json` listing nightly releases.
  pub fn write_overlay(&self, latest: &str, releases: &[(&str, &str)]) {
    let releases: Vec<String> = releases
      .iter()
      .map(|(date, sha)| format!(r#""{date}": "{sha}""#))
      .collect();
    let body = format!(
      r#"{{"version": 1, "channels": {{"nightly": {{"latest": "{latest}", "releases": {{{}}}}}}}}}"#,
      releases.join(", ")
    );
    let dir = self.root.join("overlay");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.json"), body).unwrap();
  }

  /// cmake, pkg-config, freetype (freetype2.pc) and fontconfig as
  /// store-style entries.
  pub fn install_native_deps(&self) {
    self.install_tool("cmake-3.19.7", "cmake");
    self.install_tool("pkg-config-0.29.2", "pkg-config");
    self.install_library("freetype-2.10.4-dev", "freetype2", "23.4.17");
    self.install_library("fontconfig-2.13.93-dev", "fontconfig", "2.13.93");
  }

  pub fn install_tool(&self, entry: &str, exe: &str) -> PathBuf {
    let bin = self.index_root.join(entry).join("bin");
    write_executable(&bin.join(exe), "#!/bin/sh\nexit 0\n");
    bin
  }

  pub fn install_library(&self, entry: &str, pc: &str, version: &str) -> PathBuf {
    let prefix = self.index_root.join(entry);
    let pc_dir = prefix.join("lib").join("pkgconfig");
    fs::create_dir_all(&pc_dir).unwrap();
    let body = format!(
      "prefix={}\nlibdir=${{prefix}}/lib\nincludedir=${{prefix}}/include\n\nName: {pc}\nVersion: {version}\nLibs: -L${{libdir}} -l{pc}\nCflags: -I${{includedir}}\n",
      prefix.display()
    );
    fs::write(pc_dir.join(format!("{pc}.pc")), body).unwrap();
    pc_dir
  }

  /// Installs a toolchain whose `cargo` fakes `cargo build`: it writes a
  /// shell-script binary into `$CARGO_TARGET_DIR/<profile>/<bin>`. The
  /// binary records its arguments in `$CARGO_TARGET_DIR/last-run` and exits
  /// with status 3.
  pub fn install_toolchain(&self, name: &str) -> PathBuf {
    let bin = self.settings.toolchains_dir.join(name).join("bin");
    write_executable(&bin.join("rustc"), "#!/bin/sh\nexit 0\n");
    write_executable(
      &bin.join("cargo"),
      r#"#!/bin/sh
profile=""
bin=""
while [ $# -gt 0 ]; do
  case "$1" in
    --profile) profile="$2"; shift 2 ;;
    --bin) bin="$2"; shift 2 ;;
    *) shift ;;
  esac
done
dir="$CARGO_TARGET_DIR/$profile"
/bin/mkdir -p "$dir"
printf '#!/bin/sh\necho "$*" > "%s/last-run"\nexit 3\n' "$CARGO_TARGET_DIR" > "$dir/$bin"
/bin/chmod +x "$dir/$bin"
echo "$SOURCE_DATE_EPOCH" > "$CARGO_TARGET_DIR/epoch"
echo "${PGDATA-unset}" > "$CARGO_TARGET_DIR/pgdata"
"#,
    );
    bin
  }

  /// Minimal cargo project sources in the project root.
  pub fn write_sources(&self) {
    fs::write(
      self.root.join("Cargo.toml"),
      "[package]\nname = \"dbr-sim\"\nversion = \"0.1.0\"\nedition = \"2018\"\n",
    )
    .unwrap();
    fs::create_dir_all(self.root.join("src")).unwrap();
    fs::write(self.root.join("src/main.rs"), "fn main() {}\n").unwrap();
  }
}

pub fn write_executable(path: &Path, script: &str) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, script).unwrap();
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
  }
}

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
"#
  )
}
