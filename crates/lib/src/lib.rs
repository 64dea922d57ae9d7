//! envpin-lib: Core types and logic for envpin
//!
//! This crate turns a declarative project descriptor (`envpin.lua`) into:
//! - a pinned, integrity-checked Rust toolchain (`toolchain`)
//! - a resolved native dependency set split into build-time tools and
//!   link-time libraries (`deps`)
//! - an isolated development shell environment (`shell`)
//! - a buildable package and a runnable app derived from the same canonical
//!   package definition (`package`)
//!
//! [`eval::evaluate`] ties the pieces together; every failure along the way is
//! fatal and nothing is written until the whole descriptor resolves.

pub mod config;
pub mod consts;
pub mod deps;
pub mod descriptor;
pub mod eval;
pub mod fetch;
pub mod init;
pub mod inputs;
pub mod package;
pub mod platform;
pub mod shell;
pub mod toolchain;
pub mod update;
pub mod util;
