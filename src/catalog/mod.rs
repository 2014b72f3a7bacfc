//! Package catalog
//!
//! This module handles:
//! - Listing the packages a build target expression matches
//! - Classifying packages as binary-producing or library-only
//! - Recording each binary package's native install directory
//! - Detecting the resolution mode (GOPATH or module)
//! - Listing the in-project dependencies the matched packages import, so
//!   their build files are known when the workspace is mirrored
//!
//! Packages are kept sorted by import path so every diagnostic derived from a
//! catalog is reproducible.

pub mod install_dir;
pub mod listing;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ToolchainEnv;
use crate::error::{self, Result};
use crate::path_utils;

pub use listing::{GoList, ListedModule, ListedPackage, PackageLister, parse_listing};

/// Source directory below each GOPATH entry
pub const GOPATH_SRC_DIR: &str = "src";

/// Package name of binary-producing packages
pub const MAIN_PACKAGE: &str = "main";

/// How the toolchain maps import paths onto directories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Flat path-based resolution under `<GOPATH entry>/src`
    GoPath,
    /// Module-rooted resolution below a `go.mod`
    Module,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoPath => write!(f, "GOPATH"),
            Self::Module => write!(f, "module"),
        }
    }
}

/// The main module of a module-mode request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub path: String,
    pub dir: PathBuf,
}

/// One buildable package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Import path, unique within the resolution mode
    pub import_path: String,

    /// Go package name (`main` for binaries)
    pub name: String,

    /// Original source directory
    pub source_dir: PathBuf,

    /// GOPATH entry the package was found in (GOPATH mode)
    pub root: Option<PathBuf>,

    /// Module the package belongs to (module mode)
    pub module: Option<ModuleInfo>,

    /// Directory a plain `go install` would put the binary in
    pub install_dir: Option<PathBuf>,

    /// Location of the copy inside the scratch workspace, once staged
    pub mirrored_dir: Option<PathBuf>,

    /// Transitive imports
    pub deps: Vec<String>,

    /// Files the build may reference, relative to `source_dir`
    pub build_files: Vec<String>,
}

impl Package {
    pub fn is_main(&self) -> bool {
        self.name == MAIN_PACKAGE
    }

    fn from_listed(listed: &ListedPackage, mode: ResolutionMode, env: &ToolchainEnv) -> Self {
        let is_main = listed.name == MAIN_PACKAGE;
        Self {
            import_path: listed.import_path.clone(),
            name: listed.name.clone(),
            source_dir: listed.dir.clone(),
            root: (!listed.root.is_empty()).then(|| PathBuf::from(&listed.root)),
            module: listed.module.as_ref().map(|m| ModuleInfo {
                path: m.path.clone(),
                dir: m.dir.clone(),
            }),
            install_dir: if is_main {
                install_dir::native_install_dir(listed, mode, env)
            } else {
                None
            },
            mirrored_dir: None,
            deps: listed.deps.clone(),
            build_files: listed.build_files(),
        }
    }
}

/// Every package implicated by one build request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCatalog {
    mode: ResolutionMode,
    targets: Vec<String>,
    packages: Vec<Package>,
    /// Imported packages inside the project that the targets did not match
    dependencies: Vec<Package>,
}

impl PackageCatalog {
    /// List `targets` with `lister` and build the catalog
    pub fn load(
        lister: &dyn PackageLister,
        root: &Path,
        targets: &[String],
        flags: &[String],
        env: &ToolchainEnv,
    ) -> Result<Self> {
        let listed = lister.list(root, targets, flags, env)?;
        let mut catalog = Self::from_listing(listed, targets, env)?;

        let local: Vec<String> = catalog.local_dependencies().into_keys().collect();
        if !local.is_empty() {
            debug!(dependencies = local.len(), "listing in-project dependencies");
            let listed = lister.list(root, &local, flags, env)?;
            catalog.attach_dependencies(listed, env)?;
        }

        Ok(catalog)
    }

    /// Build a catalog from an already decoded listing
    ///
    /// Fails when a package could not be loaded, when nothing matched, when
    /// the listing mixes resolution modes, and when no package is a binary.
    pub fn from_listing(
        listed: Vec<ListedPackage>,
        targets: &[String],
        env: &ToolchainEnv,
    ) -> Result<Self> {
        if let Some(broken) = listed.iter().find(|p| p.error.is_some()) {
            let reason = broken
                .error
                .as_ref()
                .map(|e| e.err.clone())
                .unwrap_or_default();
            return Err(error::catalog::package_broken(
                broken.import_path.clone(),
                reason,
            ));
        }

        if listed.is_empty() {
            return Err(error::catalog::no_packages(targets));
        }

        let mode = detect_mode(&listed)?;

        let mut by_path: BTreeMap<String, Package> = BTreeMap::new();
        for entry in &listed {
            by_path
                .entry(entry.import_path.clone())
                .or_insert_with(|| Package::from_listed(entry, mode, env));
        }

        let catalog = Self {
            mode,
            targets: targets.to_vec(),
            packages: by_path.into_values().collect(),
            dependencies: Vec::new(),
        };

        if catalog.binaries().next().is_none() {
            return Err(error::catalog::no_binaries(targets));
        }

        debug!(
            mode = %catalog.mode,
            packages = catalog.packages.len(),
            binaries = catalog.binaries().count(),
            "package catalog ready"
        );

        Ok(catalog)
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// The target expression this catalog was listed for
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn packages_mut(&mut self) -> &mut [Package] {
        &mut self.packages
    }

    /// Binary-producing packages, in import path order
    pub fn binaries(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| p.is_main())
    }

    pub fn get(&self, import_path: &str) -> Option<&Package> {
        self.packages
            .binary_search_by(|p| p.import_path.as_str().cmp(import_path))
            .ok()
            .map(|i| &self.packages[i])
    }

    /// Record the listing of in-project dependencies
    ///
    /// Entries that are already part of the catalog are ignored; a dependency
    /// that cannot be loaded fails the catalog.
    pub fn attach_dependencies(&mut self, listed: Vec<ListedPackage>, env: &ToolchainEnv) -> Result<()> {
        let mut by_path: BTreeMap<String, Package> = self
            .dependencies
            .drain(..)
            .map(|p| (p.import_path.clone(), p))
            .collect();

        for entry in &listed {
            if let Some(err) = &entry.error {
                return Err(error::catalog::package_broken(
                    entry.import_path.clone(),
                    err.err.clone(),
                ));
            }
            if self.get(&entry.import_path).is_some() {
                continue;
            }
            by_path
                .entry(entry.import_path.clone())
                .or_insert_with(|| Package::from_listed(entry, self.mode, env));
        }

        self.dependencies = by_path.into_values().collect();
        Ok(())
    }

    /// Listed in-project dependencies, in import path order
    pub fn dependencies(&self) -> &[Package] {
        &self.dependencies
    }

    pub fn dependency(&self, import_path: &str) -> Option<&Package> {
        self.dependencies
            .binary_search_by(|p| p.import_path.as_str().cmp(import_path))
            .ok()
            .map(|i| &self.dependencies[i])
    }

    /// Imports that live inside the project but were not matched, with their
    /// source directory
    ///
    /// Module mode: imports below the main module path. GOPATH mode: imports
    /// found under the GOPATH entry of the importing package.
    pub fn local_dependencies(&self) -> BTreeMap<String, PathBuf> {
        let matched: BTreeSet<&str> = self.packages.iter().map(|p| p.import_path.as_str()).collect();
        let mut local = BTreeMap::new();

        for package in &self.packages {
            for dep in &package.deps {
                if matched.contains(dep.as_str()) || local.contains_key(dep) {
                    continue;
                }
                let dir = match (self.mode, &package.module, &package.root) {
                    (ResolutionMode::Module, Some(module), _) => {
                        path_utils::strip_import_prefix(dep, &module.path)
                            .map(|rest| module.dir.join(path_utils::import_path_to_relative(rest)))
                    }
                    (ResolutionMode::GoPath, _, Some(root)) => Some(
                        root.join(GOPATH_SRC_DIR)
                            .join(path_utils::import_path_to_relative(dep)),
                    ),
                    _ => None,
                };
                if let Some(dir) = dir.filter(|d| d.is_dir()) {
                    local.insert(dep.clone(), dir);
                }
            }
        }

        local
    }

    /// The main module, in module mode
    pub fn main_module(&self) -> Option<&ModuleInfo> {
        match self.mode {
            ResolutionMode::Module => self.packages.first().and_then(|p| p.module.as_ref()),
            ResolutionMode::GoPath => None,
        }
    }
}

/// All packages must agree on module membership, and module-mode requests
/// must stay within a single module.
fn detect_mode(listed: &[ListedPackage]) -> Result<ResolutionMode> {
    let with_module = listed.iter().filter(|p| p.module.is_some()).count();

    if with_module == 0 {
        return Ok(ResolutionMode::GoPath);
    }

    if with_module != listed.len() {
        return Err(error::catalog::list_failed(
            "listing mixes GOPATH packages and module packages",
        ));
    }

    let mut module_dirs: Vec<&Path> = listed
        .iter()
        .filter_map(|p| p.module.as_ref())
        .map(|m| m.dir.as_path())
        .collect();
    module_dirs.sort();
    module_dirs.dedup();

    if module_dirs.len() > 1 {
        return Err(error::catalog::list_failed(format!(
            "packages span {} modules; install one module at a time",
            module_dirs.len()
        )));
    }

    Ok(ResolutionMode::Module)
}
