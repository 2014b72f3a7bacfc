//! Native install directory rules
//!
//! Mirrors where a plain `go install` would put a binary:
//! 1. the directory of the listing's `Target`
//! 2. an absolute `GOBIN`
//! 3. `<package root>/bin` in GOPATH mode
//! 4. `<first GOPATH entry>/bin` in module mode (`<home>/go/bin` when GOPATH is unset)
//!
//! A relative `GOBIN` is rejected by the toolchain, so it leaves the package
//! unresolved instead of guessing.

use std::path::{Path, PathBuf};

use crate::config::ToolchainEnv;
use crate::config::env::BIN_DIR;

use super::ResolutionMode;
use super::listing::ListedPackage;

pub fn native_install_dir(
    pkg: &ListedPackage,
    mode: ResolutionMode,
    env: &ToolchainEnv,
) -> Option<PathBuf> {
    if let Some(dir) = Path::new(&pkg.target)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        return Some(dir.to_path_buf());
    }

    if let Some(gobin) = env.gobin() {
        return gobin.is_absolute().then_some(gobin);
    }

    match mode {
        ResolutionMode::GoPath => {
            (!pkg.root.is_empty()).then(|| PathBuf::from(&pkg.root).join(BIN_DIR))
        }
        ResolutionMode::Module => env.gopath_entries().first().map(|p| p.join(BIN_DIR)),
    }
}
