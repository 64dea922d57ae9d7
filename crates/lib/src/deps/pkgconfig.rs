//! Minimal `.pc` file reader.
//!
//! Only what environment construction needs: variables with `${var}`
//! expansion and the `Name`, `Description`, `Version`, `Libs`, `Cflags` and
//! `Requires` fields.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PkgConfig {
  pub name: String,
  pub version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub libs: Vec<String>,
  pub cflags: Vec<String>,
  /// Required module names, without version constraints.
  pub requires: Vec<String>,
  #[serde(skip)]
  pub variables: BTreeMap<String, String>,
}

impl PkgConfig {
  pub fn variable(&self, name: &str) -> Option<&str> {
    self.variables.get(name).map(String::as_str)
  }
}

/// Parses the content of a `.pc` file.
pub fn parse(content: &str) -> Result<PkgConfig, String> {
  let mut variables = BTreeMap::new();
  let mut fields: BTreeMap<String, String> = BTreeMap::new();

  for (lineno, raw) in content.lines().enumerate() {
    let line = match raw.find('#') {
      Some(pos) => &raw[..pos],
      None => raw,
    }
    .trim();
    if line.is_empty() {
      continue;
    }

    let colon = line.find(':');
    let equals = line.find('=');
    match (colon, equals) {
      (Some(c), e) if e.is_none_or(|e| c < e) => {
        let key = line[..c].trim();
        let value = expand(line[c + 1..].trim(), &variables).map_err(|e| format!("line {}: {e}", lineno + 1))?;
        fields.insert(key.to_string(), value);
      }
      (_, Some(e)) => {
        let key = line[..e].trim();
        if key.is_empty() {
          return Err(format!("line {}: empty variable name", lineno + 1));
        }
        let value = expand(line[e + 1..].trim(), &variables).map_err(|e| format!("line {}: {e}", lineno + 1))?;
        variables.insert(key.to_string(), value);
      }
      _ => return Err(format!("line {}: expected 'key: value' or 'name=value'", lineno + 1)),
    }
  }

  let required = |key: &str| {
    fields
      .get(key)
      .filter(|v| !v.is_empty())
      .cloned()
      .ok_or_else(|| format!("missing '{key}' field"))
  };

  Ok(PkgConfig {
    name: required("Name")?,
    version: required("Version")?,
    description: fields.get("Description").cloned(),
    libs: split_flags(fields.get("Libs")),
    cflags: split_flags(fields.get("Cflags")),
    requires: split_requires(fields.get("Requires")),
    variables,
  })
}

fn expand(value: &str, variables: &BTreeMap<String, String>) -> Result<String, String> {
  let mut out = String::with_capacity(value.len());
  let mut rest = value;
  while let Some(start) = rest.find("${") {
    out.push_str(&rest[..start]);
    let after = &rest[start + 2..];
    let end = after.find('}').ok_or_else(|| "unterminated '${'".to_string())?;
    let name = &after[..end];
    let resolved = variables
      .get(name)
      .ok_or_else(|| format!("undefined variable '{name}'"))?;
    out.push_str(resolved);
    rest = &after[end + 1..];
  }
  out.push_str(rest);
  Ok(out)
}

fn split_flags(value: Option<&String>) -> Vec<String> {
  value
    .map(|v| v.split_whitespace().map(str::to_string).collect())
    .unwrap_or_default()
}

// "freetype2 >= 2.8.1, expat" -> ["freetype2", "expat"]
fn split_requires(value: Option<&String>) -> Vec<String> {
  let Some(value) = value else {
    return Vec::new();
  };
  let mut names = Vec::new();
  let mut skip_version = false;
  for token in value.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
    if skip_version {
      skip_version = false;
      continue;
    }
    if matches!(token, "=" | "<" | ">" | "<=" | ">=" | "!=") {
      skip_version = true;
      continue;
    }
    names.push(token.to_string());
  }
  names
}
