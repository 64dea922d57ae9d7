//! Shared utilities: hashing and test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;

/// Platform file name of an executable (`cargo`, `cargo.exe`).
pub fn exe_name(name: &str) -> String {
  format!("{name}{}", std::env::consts::EXE_SUFFIX)
}
