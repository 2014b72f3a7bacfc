//! Configuration for covstage
//!
//! This module provides:
//! - [`StageConfig`]: settings from the optional `covstage.yaml` in the project root
//! - [`ToolchainEnv`]: a request-scoped snapshot of the toolchain environment
//!
//! Nothing here reads or writes process-wide state after the snapshot has
//! been taken; every request carries its own copies.

pub mod env;
pub mod stage;

pub use env::ToolchainEnv;
pub use stage::{CONFIG_FILE, StageConfig};
