//! `envpin build` and `envpin run` integration tests.

#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_links_result() {
  let env = TestEnv::dated_flake();

  env
    .envpin_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built: dbr-sim"));

  let link = env.project.join("result");
  let target = std::fs::read_link(&link).unwrap();
  assert!(target.starts_with(env.store_path().join("packages")));
  assert!(link.join("bin/dbr-sim").is_file());
}

#[test]
fn second_build_is_cached() {
  let env = TestEnv::dated_flake();

  env.envpin_cmd().arg("build").assert().success();
  env
    .envpin_cmd()
    .args(["--locked", "build", "--no-link"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Up to date: dbr-sim"));
}

#[test]
fn no_link_leaves_the_project_alone() {
  let env = TestEnv::dated_flake();

  env.envpin_cmd().args(["build", "--no-link"]).assert().success();
  assert!(!env.project.join("result").exists());
}

#[test]
fn run_forwards_arguments_and_exit_code() {
  let env = TestEnv::dated_flake();

  env
    .envpin_cmd()
    .args(["run", "--", "--scenario", "smoke"])
    .assert()
    .code(3)
    .stdout(predicate::str::contains("dbr-sim --headless --scenario smoke"));
}

#[test]
fn shell_only_descriptor_cannot_build() {
  let env = TestEnv::from_fixture("shell_pgdata.lua");

  env
    .envpin_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no build section"));
}

#[test]
fn explicit_descriptor_path() {
  let env = TestEnv::dated_flake();
  let other = env.temp.path().join("elsewhere");
  std::fs::create_dir_all(&other).unwrap();

  env
    .envpin_cmd()
    .current_dir(&other)
    .arg("-f")
    .arg(env.descriptor_path())
    .args(["build", "--no-link"])
    .assert()
    .success();
}
