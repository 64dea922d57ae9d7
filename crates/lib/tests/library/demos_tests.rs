//! The shipped dbr-sim descriptors load and keep their variants apart.

use std::path::PathBuf;

use envpin_lib::descriptor;
use envpin_lib::fetch::Source;
use envpin_lib::toolchain::ToolchainPin;

fn demo(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("../../demos/dbr-sim")
    .join(name)
}

#[test]
fn every_variant_declares_the_same_dependencies() {
  for name in ["shell.lua", "shell-pgdata.lua", "flake-overlay.lua", "flake-dated.lua"] {
    let outputs = descriptor::load(&demo(name)).unwrap().outputs().unwrap();
    let deps = &outputs.package.deps;
    let tools: Vec<&str> = deps.native_build_inputs.iter().map(|d| d.name.as_str()).collect();
    let libraries: Vec<&str> = deps.build_inputs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(tools, ["cmake", "pkg-config"], "{name}");
    assert_eq!(libraries, ["fontconfig", "freetype"], "{name}");
    assert_eq!(outputs.package.name, "dbr-sim");
  }
}

#[test]
fn only_the_pgdata_variant_sets_pgdata() {
  for (name, expected) in [
    ("shell.lua", None),
    ("shell-pgdata.lua", Some("./db/content")),
    ("flake-overlay.lua", None),
    ("flake-dated.lua", None),
  ] {
    let outputs = descriptor::load(&demo(name)).unwrap().outputs().unwrap();
    assert_eq!(outputs.dev_shell.env.get("PGDATA").map(String::as_str), expected, "{name}");
  }
}

#[test]
fn flakes_differ_only_in_the_toolchain_pin() {
  let overlay = descriptor::load(&demo("flake-overlay.lua")).unwrap().outputs().unwrap();
  let dated = descriptor::load(&demo("flake-dated.lua")).unwrap().outputs().unwrap();

  assert!(matches!(
    overlay.package.toolchain.as_ref().unwrap().pin,
    ToolchainPin::Overlay { .. }
  ));
  assert!(matches!(
    dated.package.toolchain.as_ref().unwrap().pin,
    ToolchainPin::Dated { .. }
  ));
  assert_eq!(overlay.package.build, dated.package.build);
  assert_eq!(overlay.app.as_ref().unwrap().program, "dbr-sim");
  assert_eq!(dated.app.as_ref().unwrap().package, dated.package_hash);
}

#[test]
fn overlay_input_lives_beside_the_descriptor() {
  let overlay = descriptor::load(&demo("flake-overlay.lua")).unwrap();
  let input = &overlay.decl.inputs["rust-overlay"];
  match Source::parse(input.url(), &overlay.dir) {
    Source::File(path) => {
      assert!(path.starts_with(&overlay.dir), "{} escapes the demo dir", path.display());
      assert!(path.is_file(), "{} is missing", path.display());
    }
    other => panic!("expected a local overlay, got {other:?}"),
  }
}
