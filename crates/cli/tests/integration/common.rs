//! Shared test helpers for CLI integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use envpin_lib::platform::rust_host;
use envpin_lib::util::hash::hash_bytes;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// The project lives in `<temp>/project`; store, toolchains, dist server and
/// package index are siblings and handed to `envpin` through its
/// environment variables.
pub struct TestEnv {
  pub temp: TempDir,
  pub project: PathBuf,
}

impl TestEnv {
  /// Create an empty test environment.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let project = dunce::canonicalize(temp.path()).unwrap().join("project");
    fs::create_dir_all(&project).unwrap();
    Self { temp, project }
  }

  /// Create from a fixture file, with the native dependencies installed.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self::empty();
    env.install_native_deps();
    env.write_descriptor(&fixture_content(name));
    env
  }

  /// Dated-nightly package with a published manifest and toolchain.
  pub fn dated_flake() -> Self {
    let env = Self::empty();
    env.install_native_deps();
    env.install_toolchain("nightly-2021-03-01");
    env.write_sources();
    let sha = env.publish_nightly("2021-03-01");
    env.write_descriptor(&fixture_content("dated_flake.lua").replace("@SHA@", &sha));
    env
  }

  fn path(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn index_path(&self) -> PathBuf {
    self.path("pkgs")
  }

  pub fn store_path(&self) -> PathBuf {
    self.path("store")
  }

  pub fn toolchains_path(&self) -> PathBuf {
    self.path("toolchains")
  }

  pub fn dist_path(&self) -> PathBuf {
    self.path("dist-server")
  }

  pub fn descriptor_path(&self) -> PathBuf {
    self.project.join("envpin.lua")
  }

  pub fn lock_path(&self) -> PathBuf {
    self.project.join("envpin.lock")
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.project.join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  pub fn write_descriptor(&self, content: &str) {
    self.write_file("envpin.lua", content);
  }

  pub fn write_sources(&self) {
    self.write_file(
      "Cargo.toml",
      "[package]\nname = \"dbr-sim\"\nversion = \"0.1.0\"\nedition = \"2018\"\n",
    );
    self.write_file("src/main.rs", "fn main() {}\n");
  }

  /// Publishes a nightly channel manifest and returns its sha256.
  pub fn publish_nightly(&self, date: &str) -> String {
    let host = rust_host().unwrap();
    let body = format!(
      "manifest-version = \"2\"\ndate = \"{date}\"\n\n\
       [pkg.rustc]\nversion = \"1.52.0-nightly (0f6f2d681 {date})\"\n[pkg.rustc.target.{host}]\navailable = true\n\n\
       [pkg.cargo]\nversion = \"1.52.0-nightly (c68432f1e {date})\"\n[pkg.cargo.target.{host}]\navailable = true\n\n\
       [pkg.rust-std]\nversion = \"1.52.0-nightly (0f6f2d681 {date})\"\n[pkg.rust-std.target.{host}]\navailable = true\n"
    );
    let dir = self.dist_path().join("dist").join(date);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("channel-rust-nightly.toml"), &body).unwrap();
    hash_bytes(body.as_bytes()).0
  }

  pub fn write_overlay(&self, latest: &str, releases: &[(&str, &str)]) {
    let releases: Vec<String> = releases
      .iter()
      .map(|(date, sha)| format!(r#""{date}": "{sha}""#))
      .collect();
    self.write_file(
      "overlay/index.json",
      &format!(
        r#"{{"version": 1, "channels": {{"nightly": {{"latest": "{latest}", "releases": {{{}}}}}}}}}"#,
        releases.join(", ")
      ),
    );
  }

  /// cmake prints the session's PGDATA and its first argument, then exits
  /// with status 7.
  pub fn install_native_deps(&self) {
    let index = self.index_path();
    write_executable(
      &index.join("cmake-3.19.7/bin/cmake"),
      "#!/bin/sh\necho \"PGDATA=${PGDATA-unset} $1\"\nexit 7\n",
    );
    write_executable(&index.join("pkg-config-0.29.2/bin/pkg-config"), "#!/bin/sh\nexit 0\n");
    write_pc(&index.join("freetype-2.10.4-dev"), "freetype2", "23.4.17");
    write_pc(&index.join("fontconfig-2.13.93-dev"), "fontconfig", "2.13.93");
  }

  /// A toolchain whose cargo writes a shell-script `dbr-sim` that echoes
  /// its arguments and exits with status 3.
  pub fn install_toolchain(&self, name: &str) {
    let bin = self.toolchains_path().join(name).join("bin");
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
/bin/mkdir -p "$CARGO_TARGET_DIR/$profile"
printf '#!/bin/sh\necho "dbr-sim $*"\nexit 3\n' > "$CARGO_TARGET_DIR/$profile/$bin"
/bin/chmod +x "$CARGO_TARGET_DIR/$profile/$bin"
"#,
    );
  }

  /// Get a pre-configured Command for the envpin binary, running in the
  /// project directory.
  ///
  /// Sets environment variables for isolated testing:
  /// - `ENVPIN_STORE`, `ENVPIN_TOOLCHAINS`: per-test directories
  /// - `ENVPIN_DIST_SERVER`: local dist directory
  /// - `ENVPIN_INDEX_PATH`: fake package index
  /// - `ENVPIN_NO_RUSTUP`: never install toolchains
  pub fn envpin_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("envpin");
    cmd.current_dir(&self.project);
    cmd.env("ENVPIN_STORE", self.store_path());
    cmd.env("ENVPIN_TOOLCHAINS", self.toolchains_path());
    cmd.env("ENVPIN_DIST_SERVER", self.dist_path());
    cmd.env("ENVPIN_INDEX_PATH", self.index_path());
    cmd.env("ENVPIN_NO_RUSTUP", "1");
    cmd.env_remove("RUST_LOG");
    cmd
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

fn write_pc(prefix: &Path, pc: &str, version: &str) {
  let dir = prefix.join("lib/pkgconfig");
  fs::create_dir_all(&dir).unwrap();
  fs::write(
    dir.join(format!("{pc}.pc")),
    format!(
      "prefix={}\nlibdir=${{prefix}}/lib\n\nName: {pc}\nVersion: {version}\nLibs: -L${{libdir}} -l{pc}\n",
      prefix.display()
    ),
  )
  .unwrap();
}
