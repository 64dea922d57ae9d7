use crate::consts::APP_NAME;
use std::path::PathBuf;

/// Reads a directory from an environment variable, ignoring empty values.
fn env_dir(var: &str) -> Option<PathBuf> {
  std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the user's home directory
///
/// Falls back to the system temp directory when no home is set, which keeps
/// envpin usable inside minimal build sandboxes.
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  env_dir("USERPROFILE").unwrap_or_else(std::env::temp_dir)
}

/// Returns the user's home directory
///
/// Falls back to the system temp directory when no home is set, which keeps
/// envpin usable inside minimal build sandboxes.
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  env_dir("HOME").unwrap_or_else(std::env::temp_dir)
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  env_dir("APPDATA")
    .unwrap_or_else(|| home_dir().join("AppData").join("Roaming"))
    .join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  env_dir("XDG_DATA_HOME")
    .unwrap_or_else(|| home_dir().join(".local").join("share"))
    .join(APP_NAME)
}

/// Default content-addressed store: verified manifests, inputs and build outputs.
pub fn default_store_dir() -> PathBuf {
  data_dir().join("store")
}

/// Default directory holding pre-installed toolchains (`<name>/bin/cargo`).
pub fn default_toolchains_dir() -> PathBuf {
  data_dir().join("toolchains")
}
