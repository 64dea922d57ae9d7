//! Template content for `envpin init`.

/// Template for `envpin.lua`; `{name}` is replaced with the project name.
pub const DESCRIPTOR_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../lua/template.lua"));

/// LuaLS type definitions for descriptors.
pub const TYPES_D_LUA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../lua/envpin.d.lua"));

/// Template for .luarc.json (LuaLS configuration)
pub const LUARC_JSON_TEMPLATE: &str = r#"{
  "$schema": "https://raw.githubusercontent.com/LuaLS/vscode-lua/master/setting/schema.json",
  "runtime": {
    "version": "Lua 5.4"
  },
  "workspace": {
    "library": [
      ".envpin/types"
    ],
    "checkThirdParty": false
  },
  "diagnostics": {
    "globals": ["envpin"]
  }
}
"#;
