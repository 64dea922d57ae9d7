//! The canonical package and everything derived from it.
//!
//! [`Package`] is the single definition a descriptor produces. The app and
//! the dev shell in [`Outputs`] carry the package's hash instead of their own
//! copies of its fields, so build, run and develop can never disagree about
//! what the package is.

pub mod build;
pub mod run;
mod types;

pub use build::{BuildError, BuildOptions, BuildOutput, realize};
pub use run::run;
pub use types::*;
