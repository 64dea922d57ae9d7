//! Shell detection and environment script generation.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::SessionError;
use super::env::{ShellEnv, is_var_name};

/// Supported shell types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
  Sh,
  Bash,
  Zsh,
  Fish,
}

impl Shell {
  /// Detects the shell from a `$SHELL` value, defaulting to POSIX `sh`.
  pub fn detect(shell_var: Option<&str>) -> Self {
    let name = shell_var
      .and_then(|s| Path::new(s).file_name())
      .and_then(|n| n.to_str())
      .unwrap_or("")
      .to_lowercase();

    match name.as_str() {
      "zsh" => Shell::Zsh,
      "bash" => Shell::Bash,
      "fish" => Shell::Fish,
      n if n.contains("zsh") => Shell::Zsh,
      n if n.contains("bash") => Shell::Bash,
      n if n.contains("fish") => Shell::Fish,
      _ => Shell::Sh,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Shell::Sh => "sh",
      Shell::Bash => "bash",
      Shell::Zsh => "zsh",
      Shell::Fish => "fish",
    }
  }

  /// An export statement with the value quoted for this shell.
  pub fn export_var(&self, name: &str, value: &str) -> String {
    match self {
      Shell::Fish => format!("set -gx {name} {}", fish_quote(value)),
      Shell::Sh | Shell::Bash | Shell::Zsh => format!("export {name}={}", posix_quote(value)),
    }
  }

  pub fn comment(&self, text: &str) -> String {
    format!("# {text}")
  }
}

impl fmt::Display for Shell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Shell {
  type Err = SessionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sh" => Ok(Shell::Sh),
      "bash" => Ok(Shell::Bash),
      "zsh" => Ok(Shell::Zsh),
      "fish" => Ok(Shell::Fish),
      other => Err(SessionError::UnknownShell(other.to_string())),
    }
  }
}

// 'it'\''s'
fn posix_quote(value: &str) -> String {
  format!("'{}'", value.replace('\'', r"'\''"))
}

// Inside fish single quotes only \ and ' are special.
fn fish_quote(value: &str) -> String {
  format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'"))
}

/// Renders a session environment as a sourceable script.
///
/// Inherited names no shell can export (`BASH_FUNC_f%%`) are left out.
pub fn render_script(env: &ShellEnv, shell: Shell) -> String {
  let mut out = String::new();
  if let Some(name) = env.get(super::env::SHELL_MARKER_VAR) {
    out.push_str(&shell.comment(&format!("envpin environment for {name}")));
    out.push('\n');
  }
  for (name, value) in env.vars().iter().filter(|(name, _)| is_var_name(name)) {
    out.push_str(&shell.export_var(name, value));
    out.push('\n');
  }
  out
}
