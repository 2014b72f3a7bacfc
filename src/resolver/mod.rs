//! Install location resolution
//!
//! This module handles:
//! - Collapsing per-package install directories into an [`InstallPlan`]
//! - Applying an explicit install directory override
//! - Falling back for packages without a native install directory
//! - Making sure every destination exists before anything is built
//!
//! The toolchain accepts a single output directory per invocation, so packages
//! are grouped by destination and each group becomes one build invocation.

pub mod plan;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::{Package, PackageCatalog};
use crate::config::ToolchainEnv;
use crate::error::{self, Result};

pub use plan::{DestinationGroup, InstallPlan};

/// Resolves where every binary of a catalog ends up
#[derive(Debug, Clone, Copy)]
pub struct InstallLocationResolver<'a> {
    explicit: Option<&'a Path>,
    env: &'a ToolchainEnv,
}

impl<'a> InstallLocationResolver<'a> {
    pub fn new(env: &'a ToolchainEnv) -> Self {
        Self {
            explicit: None,
            env,
        }
    }

    /// Install every binary into `dir`, regardless of its native location
    #[must_use]
    pub fn with_explicit_dir(mut self, dir: Option<&'a Path>) -> Self {
        self.explicit = dir;
        self
    }

    /// Build the plan for all binary packages of `catalog`
    pub fn resolve(&self, catalog: &PackageCatalog) -> Result<InstallPlan> {
        let mut groups: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

        for package in catalog.binaries() {
            let dir = self.destination_for(package)?;
            groups
                .entry(dir)
                .or_default()
                .push(package.import_path.clone());
        }

        if let Some(explicit) = self.explicit {
            let native: Vec<&Path> = catalog
                .binaries()
                .filter_map(|p| p.install_dir.as_deref())
                .filter(|dir| *dir != explicit)
                .collect();
            if !native.is_empty() {
                info!(
                    install_dir = %explicit.display(),
                    overridden = native.len(),
                    "explicit install directory overrides native destinations"
                );
            }
        }

        for (dir, packages) in &groups {
            let first = packages.first().map(String::as_str).unwrap_or_default();
            ensure_destination(dir, first)?;
        }

        let plan = InstallPlan::from_groups(groups, catalog.targets());
        debug!(
            groups = plan.groups().len(),
            shared = plan.is_shared(),
            "install plan resolved"
        );
        Ok(plan)
    }

    fn destination_for(&self, package: &Package) -> Result<PathBuf> {
        if let Some(explicit) = self.explicit {
            if !explicit.is_absolute() {
                return Err(error::install_path::unresolved(
                    &package.import_path,
                    Some(explicit),
                    "install directory must be an absolute path",
                ));
            }
            return Ok(explicit.to_path_buf());
        }

        if let Some(dir) = &package.install_dir {
            return Ok(dir.clone());
        }

        match self.env.default_user_bin_dir() {
            Some(dir) if dir.is_dir() => {
                debug!(
                    package = %package.import_path,
                    dir = %dir.display(),
                    "falling back to default user binary directory"
                );
                Ok(dir)
            }
            Some(dir) => Err(error::install_path::unresolved(
                &package.import_path,
                Some(&dir),
                "no native install directory and the default binary directory does not exist",
            )),
            None => Err(error::install_path::unresolved(
                &package.import_path,
                None,
                "no native install directory and no home directory",
            )),
        }
    }
}

/// Create `dir` if needed; anything but a directory at that path is an error
fn ensure_destination(dir: &Path, package: &str) -> Result<()> {
    if dir.exists() {
        if dir.is_dir() {
            return Ok(());
        }
        return Err(error::install_path::unresolved(
            package,
            Some(dir),
            "destination exists and is not a directory",
        ));
    }

    fs::create_dir_all(dir)
        .map_err(|e| error::install_path::unresolved(package, Some(dir), e.to_string()))
}
