//! Evaluation of whole descriptors: pins, locks and dependency resolution.

use std::fs;

use envpin_lib::deps::{DependencyError, Role};
use envpin_lib::descriptor::DescriptorError;
use envpin_lib::eval::{EvalError, EvalOptions, evaluate};
use envpin_lib::inputs::{InputError, LockFile};
use envpin_lib::toolchain::ToolchainError;
use envpin_lib::util::hash::hash_bytes;

use super::common::{FLAKE_OVERLAY, TestProject, flake_dated, shell_only};

#[tokio::test]
async fn dated_flake_resolves_everything() {
  let project = TestProject::new();
  project.install_native_deps();
  let sha = project.publish_nightly("2021-03-01");
  let path = project.write_descriptor(&flake_dated(&sha, false));

  let eval = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();

  let toolchain = eval.toolchain.as_ref().unwrap();
  assert_eq!(toolchain.name, "nightly-2021-03-01");
  assert_eq!(toolchain.manifest_sha256, sha);
  assert_eq!(toolchain.host, project.host);

  let tools: Vec<&str> = eval.deps.tools.iter().map(|t| t.name.as_str()).collect();
  assert_eq!(tools, ["cmake", "pkg-config"]);
  let libraries: Vec<&str> = eval.deps.libraries.iter().map(|l| l.name.as_str()).collect();
  assert_eq!(libraries, ["fontconfig", "freetype"]);
  let freetype = &eval.deps.libraries[1];
  assert_eq!(freetype.metadata.name, "freetype2");
  assert_eq!(freetype.metadata.version, "23.4.17");

  assert!(eval.outputs.is_consistent());
  let app = eval.outputs.app.as_ref().unwrap();
  assert_eq!(app.package, eval.outputs.package_hash);
  assert_eq!(app.program, "dbr-sim");
  assert_eq!(app.args, ["--headless"]);
  assert_eq!(eval.outputs.dev_shell.package, eval.outputs.package_hash);

  // Only the toolchain is locked; there are no inputs.
  assert!(eval.lock_changed);
  let lock = LockFile::load(&project.lock_path()).unwrap().unwrap();
  assert!(lock.inputs.is_empty());
  let locked = lock.toolchain.unwrap();
  assert_eq!(locked.name, "nightly-2021-03-01");
  assert_eq!(locked.sha256, sha);
}

#[tokio::test]
async fn evaluation_is_reproducible() {
  let project = TestProject::new();
  project.install_native_deps();
  let sha = project.publish_nightly("2021-03-01");
  let path = project.write_descriptor(&flake_dated(&sha, false));

  let first = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();
  let lock_before = fs::read_to_string(project.lock_path()).unwrap();
  let second = evaluate(&path, &project.settings, &EvalOptions { locked: true })
    .await
    .unwrap();

  assert_eq!(first.outputs.package_hash, second.outputs.package_hash);
  assert_eq!(first.toolchain, second.toolchain);
  assert_eq!(first.deps, second.deps);
  assert!(!second.lock_changed);
  assert_eq!(fs::read_to_string(project.lock_path()).unwrap(), lock_before);
}

#[tokio::test]
async fn wrong_toolchain_hash_is_fatal_and_writes_nothing() {
  let project = TestProject::new();
  project.install_native_deps();
  project.publish_nightly("2021-03-01");
  let wrong = hash_bytes(b"some other manifest").0;
  let path = project.write_descriptor(&flake_dated(&wrong, false));

  let err = evaluate(&path, &project.settings, &EvalOptions::default())
    .await
    .unwrap_err();
  assert!(
    matches!(err, EvalError::Toolchain(ToolchainError::HashMismatch { .. })),
    "unexpected error: {err}"
  );
  assert!(!project.lock_path().exists());
}

#[tokio::test]
async fn missing_libraries_are_all_reported() {
  let project = TestProject::new();
  project.install_tool("cmake-3.19.7", "cmake");
  project.install_tool("pkg-config-0.29.2", "pkg-config");
  let sha = project.publish_nightly("2021-03-01");
  let path = project.write_descriptor(&flake_dated(&sha, false));

  let err = evaluate(&path, &project.settings, &EvalOptions::default())
    .await
    .unwrap_err();
  match err {
    EvalError::Dependency(DependencyError::Unresolved { missing, .. }) => {
      let names: Vec<&str> = missing.iter().map(|m| m.name.as_str()).collect();
      assert_eq!(names, ["fontconfig", "freetype"]);
      assert!(missing.iter().all(|m| m.role == Role::Library));
      assert_eq!(missing[1].wanted, "freetype2.pc");
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(!project.lock_path().exists());
}

#[tokio::test]
async fn dependency_in_both_roles_is_rejected() {
  let project = TestProject::new();
  project.install_native_deps();
  let path = project.write_descriptor(
    r#"
return {
  name = "dbr-sim",
  native_build_inputs = { "cmake", "pkg-config", "freetype" },
  build_inputs = { "freetype", "fontconfig" },
}
"#,
  );

  let err = evaluate(&path, &project.settings, &EvalOptions::default())
    .await
    .unwrap_err();
  assert!(
    matches!(
      err,
      EvalError::Descriptor(DescriptorError::Dependency(DependencyError::RoleConflict { .. }))
    ),
    "unexpected error: {err}"
  );
}

#[tokio::test]
async fn shell_only_descriptor_needs_no_toolchain() {
  let project = TestProject::new();
  project.install_native_deps();
  let path = project.write_descriptor(&shell_only(true));

  let eval = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();
  assert!(eval.toolchain.is_none());
  assert!(eval.outputs.app.is_none());
  assert!(eval.outputs.package.build.is_none());
  assert!(!eval.lock_changed);
  assert!(!project.lock_path().exists());
}

#[tokio::test]
async fn overlay_flake_locks_the_index() {
  let project = TestProject::new();
  project.install_native_deps();
  let sha = project.publish_nightly("2021-03-01");
  project.write_overlay("2021-03-01", &[("2021-03-01", &sha)]);
  let path = project.write_descriptor(FLAKE_OVERLAY);

  let eval = evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();
  assert_eq!(eval.toolchain.as_ref().unwrap().name, "nightly-2021-03-01");

  let lock = LockFile::load(&project.lock_path()).unwrap().unwrap();
  let input = lock.get("rust-overlay").unwrap();
  assert_eq!(input.type_, "path");
  assert_eq!(input.url, "path:overlay/index.json");
  let index = fs::read(project.root.join("overlay/index.json")).unwrap();
  assert_eq!(input.sha256, hash_bytes(&index).0);
  assert_eq!(lock.toolchain.unwrap().sha256, sha);
}

#[tokio::test]
async fn changed_overlay_index_fails_against_the_lock() {
  let project = TestProject::new();
  project.install_native_deps();
  let sha = project.publish_nightly("2021-03-01");
  project.write_overlay("2021-03-01", &[("2021-03-01", &sha)]);
  let path = project.write_descriptor(FLAKE_OVERLAY);
  evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();
  let lock_before = fs::read_to_string(project.lock_path()).unwrap();

  let newer = project.publish_nightly("2021-03-02");
  project.write_overlay("2021-03-02", &[("2021-03-01", &sha), ("2021-03-02", &newer)]);

  let err = evaluate(&path, &project.settings, &EvalOptions::default())
    .await
    .unwrap_err();
  assert!(
    matches!(err, EvalError::Input(InputError::HashMismatch { ref input, .. }) if input == "rust-overlay"),
    "unexpected error: {err}"
  );
  assert_eq!(fs::read_to_string(project.lock_path()).unwrap(), lock_before);
}

#[tokio::test]
async fn locked_mode_refuses_unlocked_inputs() {
  let project = TestProject::new();
  project.install_native_deps();
  let sha = project.publish_nightly("2021-03-01");
  project.write_overlay("2021-03-01", &[("2021-03-01", &sha)]);
  let path = project.write_descriptor(FLAKE_OVERLAY);

  let err = evaluate(&path, &project.settings, &EvalOptions { locked: true })
    .await
    .unwrap_err();
  assert!(
    matches!(err, EvalError::Input(InputError::NotLocked { .. })),
    "unexpected error: {err}"
  );
  assert!(!project.lock_path().exists());
}

#[tokio::test]
async fn locked_mode_refuses_a_stale_lock() {
  let project = TestProject::new();
  project.install_native_deps();
  let sha = project.publish_nightly("2021-03-01");
  let path = project.write_descriptor(&flake_dated(&sha, false));
  evaluate(&path, &project.settings, &EvalOptions::default()).await.unwrap();

  let newer = project.publish_nightly("2021-03-02");
  let moved = flake_dated(&newer, false).replace("2021-03-01", "2021-03-02");
  project.write_descriptor(&moved);

  let err = evaluate(&path, &project.settings, &EvalOptions { locked: true })
    .await
    .unwrap_err();
  assert!(matches!(err, EvalError::LockOutOfDate { .. }), "unexpected error: {err}");
}
