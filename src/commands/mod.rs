//! Command implementations for covstage CLI

pub mod install;
pub mod version;
