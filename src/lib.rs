//! covstage - install instrumented Go binaries from a scratch copy of the source tree
//!
//! The install pipeline:
//! 1. [`catalog`] lists the packages a build target expression matches
//! 2. [`workspace`] mirrors them into a fresh scratch root
//! 3. [`installer::instrument`] rewrites the mirrored binaries
//! 4. [`resolver`] works out where a plain `go install` would have put each binary
//! 5. [`installer`] builds once per destination directory
//! 6. the scratch root is removed, whatever happened
//!
//! [`operations::install::Orchestrator`] drives these steps for one
//! [`operations::install::InstallRequest`].

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod hash;
pub mod installer;
pub mod operations;
pub mod path_utils;
pub mod progress;
pub mod resolver;
pub mod temp;
pub mod workspace;

#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) mod test_fixtures;

pub use error::{CovstageError, Result};
