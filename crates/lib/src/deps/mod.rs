//! Native dependencies.
//!
//! A package declares two disjoint sets:
//! - `native_build_inputs`: build-time tools that must be on `PATH`
//!   (`cmake`, `pkg-config`)
//! - `build_inputs`: link-time libraries discovered through pkg-config
//!   metadata (`freetype`, `fontconfig`)
//!
//! Both are resolved against a [`PackageIndex`]; any name that cannot be
//! resolved makes the whole environment unusable.

pub mod index;
pub mod pkgconfig;
mod types;

pub use index::{PackageIndex, ResolvedDependencies, ResolvedLibrary, ResolvedTool, resolve};
pub use types::*;
