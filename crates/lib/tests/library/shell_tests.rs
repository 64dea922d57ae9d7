//! Dev shell environments and sessions.

use std::path::PathBuf;

use envpin_lib::eval::{EvalOptions, evaluate};
use envpin_lib::shell::env::SHELL_MARKER_VAR;
use envpin_lib::shell::{Session, ShellOptions};

use super::common::{TestProject, flake_dated, shell_only, write_executable};

fn host() -> Vec<(String, String)> {
  [
    ("HOME", "/home/dev"),
    ("PATH", "/usr/bin:/bin"),
    ("PGDATA", "/var/lib/postgres"),
    ("SSH_AUTH_SOCK", "/tmp/agent"),
  ]
  .into_iter()
  .map(|(k, v)| (k.to_string(), v.to_string()))
  .collect()
}

#[tokio::test]
async fn pgdata_is_set_only_in_the_dev_shell() {
  let project = TestProject::new();
  project.install_native_deps();
  let sha = project.publish_nightly("2021-03-01");
  let path = project.write_descriptor(&flake_dated(&sha, true));
  let eval = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();

  assert_eq!(eval.outputs.dev_shell.env.get("PGDATA").map(String::as_str), Some("./db/content"));
  let env = eval.shell_env(None, &ShellOptions::default(), host()).unwrap();
  assert_eq!(env.get("PGDATA"), Some("./db/content"));
  assert_eq!(env.get(SHELL_MARKER_VAR), Some("dbr-sim"));
  assert_eq!(env.get("HOME"), Some("/home/dev"));
  assert_eq!(env.get("SSH_AUTH_SOCK"), None);

  let target = project.root.join("target");
  let build_env = envpin_lib::package::build::build_env(&eval, None, &target).unwrap();
  assert_eq!(build_env.get("PGDATA"), None);
}

#[tokio::test]
async fn shell_without_pgdata_does_not_leak_the_host_value() {
  let project = TestProject::new();
  project.install_native_deps();
  let path = project.write_descriptor(&shell_only(false));
  let eval = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();

  let pure = eval.shell_env(None, &ShellOptions::default(), host()).unwrap();
  assert_eq!(pure.get("PGDATA"), None);

  let impure = ShellOptions {
    pure: false,
    ..Default::default()
  };
  let inherited = eval.shell_env(None, &impure, host()).unwrap();
  assert_eq!(inherited.get("PGDATA"), Some("/var/lib/postgres"));
  assert!(inherited.get("PATH").unwrap().ends_with(":/usr/bin:/bin"));
}

#[tokio::test]
async fn shell_exposes_tools_and_libraries() {
  let project = TestProject::new();
  project.install_native_deps();
  let path = project.write_descriptor(&shell_only(true));
  let eval = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();

  let env = eval.shell_env(None, &ShellOptions::default(), host()).unwrap();
  // Library entries without a bin directory add nothing to PATH.
  assert_eq!(
    env.path_dirs(),
    [
      project.index_root.join("cmake-3.19.7/bin"),
      project.index_root.join("pkg-config-0.29.2/bin"),
    ]
  );
  assert_eq!(env.which("cmake"), Some(project.index_root.join("cmake-3.19.7/bin/cmake")));

  let pkg_config_path = env.get("PKG_CONFIG_PATH").unwrap();
  let dirs: Vec<PathBuf> = std::env::split_paths(pkg_config_path).collect();
  assert_eq!(
    dirs,
    [
      project.index_root.join("fontconfig-2.13.93-dev/lib/pkgconfig"),
      project.index_root.join("freetype-2.10.4-dev/lib/pkgconfig"),
    ]
  );
  assert!(env.get("CMAKE_PREFIX_PATH").is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn session_runs_tools_with_the_session_environment() {
  let project = TestProject::new();
  project.install_native_deps();
  let out = project.root.join("cmake-saw");
  write_executable(
    &project.index_root.join("cmake-3.19.7/bin/cmake"),
    &format!(
      "#!/bin/sh\necho \"$PGDATA|$ENVPIN_SHELL|${{SSH_AUTH_SOCK-unset}}|$1\" > '{}'\nexit 7\n",
      out.display()
    ),
  );
  let path = project.write_descriptor(&shell_only(true));
  let eval = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();
  let env = eval.shell_env(None, &ShellOptions::default(), host()).unwrap();

  let code = Session::new(&env, &project.root)
    .run(&["cmake".to_string(), "--version".to_string()])
    .unwrap();
  assert_eq!(code, 7);
  let seen = std::fs::read_to_string(&out).unwrap();
  assert_eq!(seen.trim(), "./db/content|dbr-sim|unset|--version");
}

#[test]
fn session_reports_unknown_commands() {
  let env = envpin_lib::shell::ShellEnvBuilder::new("dbr-sim")
    .build(Vec::<(String, String)>::new())
    .unwrap();
  let cwd = std::env::temp_dir();
  let err = Session::new(&env, &cwd).run(&["psql".to_string()]).unwrap_err();
  assert!(err.to_string().contains("psql"));
}
