//! Rust toolchain pinning.
//!
//! A descriptor pins its toolchain in one of two ways:
//! - **overlay**: a channel name (`stable`, `beta`, `nightly`) and a version
//!   (`latest` or an explicit release), looked up in an overlay index input
//!   whose own content hash is frozen in the lock file
//! - **dated**: an explicit channel date plus the SHA-256 of that day's
//!   channel manifest
//!
//! Both end in the same place: a channel manifest fetched from the dist
//! server and verified against a known hash, yielding a
//! [`ToolchainIdentity`]. A hash mismatch aborts evaluation.

pub mod install;
pub mod manifest;
pub mod overlay;
pub mod resolve;
mod types;

pub use resolve::{ResolveContext, resolve};
pub use types::*;
