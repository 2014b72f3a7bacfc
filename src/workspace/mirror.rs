//! Path mirroring into the scratch workspace
//!
//! Only what the build can reach is copied:
//! - module mode: the module root's top-level files, `vendor/`, every listed
//!   package directory and every in-module dependency directory
//! - GOPATH mode: every listed package and every dependency that lives under
//!   the same GOPATH entry, at `<scratch>/src/<import path>`
//!
//! Package directories are copied shallowly; a Go package never spans
//! subdirectories apart from embedded assets, which are listed explicitly.
//! Dependencies are copied with the build files their own listing reports, so
//! their embedded assets survive exclude globs as well.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::{PackageCatalog, ResolutionMode};
use crate::common::fs::{CopyOptions, ExcludeSet, copy_dir_files, copy_dir_recursive};
use crate::error::{self, Result};

use super::Workspace;
use super::gomod::{self, GO_MOD, GO_WORK};

/// Module metadata files always mirrored with the module root
const MODULE_FILES: &[&str] = &[GO_MOD, "go.sum", GO_WORK, "go.work.sum"];

/// Vendored dependency directory of a module
const VENDOR_DIR: &str = "vendor";

/// Builds scratch workspaces from a package catalog
#[derive(Debug, Default)]
pub struct PathMirror {
    exclude: ExcludeSet,
}

impl PathMirror {
    pub fn new(exclude: &[String]) -> Result<Self> {
        Ok(Self {
            exclude: ExcludeSet::new(exclude)?,
        })
    }

    /// Mirror everything `catalog` needs into a new scratch root under `scratch_base`
    ///
    /// Records each package's mirrored location in the catalog. On failure the
    /// partially populated scratch root is removed before the error is returned.
    pub fn stage(
        &self,
        catalog: &mut PackageCatalog,
        original_root: &Path,
        scratch_base: &Path,
    ) -> Result<Workspace> {
        fs::read_dir(original_root)
            .map_err(|e| error::staging::root_unreadable(original_root, e))?;
        let original_root = dunce::canonicalize(original_root)
            .map_err(|e| error::staging::root_unreadable(original_root, e))?;

        let mut workspace = Workspace::create(&original_root, catalog.mode(), scratch_base)?;

        let populated = match catalog.mode() {
            ResolutionMode::Module => self.stage_module(&mut workspace, catalog),
            ResolutionMode::GoPath => self.stage_gopath(&mut workspace, catalog),
        };

        match populated {
            Ok(files) => {
                debug!(
                    scratch = %workspace.root().display(),
                    working_dir = %workspace.working_dir().display(),
                    files,
                    "workspace staged"
                );
                Ok(workspace)
            }
            Err(e) => {
                if let Err(cleanup) = workspace.cleanup() {
                    warn!("{cleanup}");
                }
                Err(e)
            }
        }
    }

    fn stage_module(&self, workspace: &mut Workspace, catalog: &mut PackageCatalog) -> Result<usize> {
        let module = catalog
            .main_module()
            .cloned()
            .ok_or_else(|| error::catalog::list_failed("module-mode listing without a module"))?;
        let scratch_root = workspace.root().to_path_buf();
        let mut copied = 0;

        let root_files: Vec<String> = catalog
            .packages()
            .iter()
            .filter(|p| same_dir(&p.source_dir, &module.dir))
            .flat_map(|p| p.build_files.iter().cloned())
            .collect();
        copied += self.copy_package(&module.dir, &scratch_root, &root_files, MODULE_FILES)?;

        let vendor = module.dir.join(VENDOR_DIR);
        if vendor.is_dir() {
            copy_dir_recursive(&vendor, &scratch_root.join(VENDOR_DIR))
                .map_err(|e| error::staging::copy_failed(&vendor, e))?;
        }

        let mut staged: BTreeSet<PathBuf> = BTreeSet::new();
        staged.insert(module.dir.clone());

        for package in catalog.packages_mut() {
            let rel = relative_to(&package.source_dir, &module.dir).ok_or_else(|| {
                error::staging::outside_project(&package.source_dir, &module.dir)
            })?;
            let target = scratch_root.join(&rel);
            if staged.insert(package.source_dir.clone()) {
                copied += self.copy_package(&package.source_dir, &target, &package.build_files, &[])?;
            }
            package.mirrored_dir = Some(target);
        }

        for (import_path, dir) in catalog.local_dependencies() {
            let Some(target) = workspace.mirror_path(&import_path, Some(&module)) else {
                continue;
            };
            copied += self.copy_dependency(catalog, &import_path, dir, &target, &mut staged)?;
        }

        gomod::rewrite_relative_paths(&scratch_root, &module.dir)?;

        let rel = relative_to(workspace.original_root(), &module.dir).ok_or_else(|| {
            error::staging::outside_project(workspace.original_root(), &module.dir)
        })?;
        workspace.set_working_dir(scratch_root.join(rel));

        Ok(copied)
    }

    fn stage_gopath(&self, workspace: &mut Workspace, catalog: &mut PackageCatalog) -> Result<usize> {
        let mut staged: BTreeSet<PathBuf> = BTreeSet::new();
        let mut roots: BTreeSet<PathBuf> = BTreeSet::new();
        let mut copied = 0;

        for package in catalog.packages_mut() {
            let target = workspace
                .mirror_path(&package.import_path, None)
                .ok_or_else(|| error::staging::copy_failed(&package.source_dir, "no GOPATH layout"))?;
            if staged.insert(package.source_dir.clone()) {
                copied += self.copy_package(&package.source_dir, &target, &package.build_files, &[])?;
            }
            package.mirrored_dir = Some(target);
            if let Some(root) = &package.root {
                roots.insert(root.clone());
            }
        }

        for (import_path, dir) in catalog.local_dependencies() {
            let Some(target) = workspace.mirror_path(&import_path, None) else {
                continue;
            };
            copied += self.copy_dependency(catalog, &import_path, dir, &target, &mut staged)?;
        }

        let original_root = workspace.original_root().to_path_buf();
        let working_dir = roots
            .iter()
            .find_map(|root| relative_to(&original_root, root))
            .map(|rel| workspace.root().join(rel));

        match (working_dir, roots.first()) {
            (Some(dir), _) => workspace.set_working_dir(dir),
            (None, Some(root)) => {
                return Err(error::staging::outside_project(&original_root, root));
            }
            (None, None) => {
                return Err(error::staging::copy_failed(
                    &original_root,
                    "GOPATH-mode packages carry no GOPATH root",
                ));
            }
        }

        Ok(copied)
    }

    /// Copy one unmatched dependency, keeping the build files its listing
    /// reports; without a listing only the exclude globs decide
    fn copy_dependency(
        &self,
        catalog: &PackageCatalog,
        import_path: &str,
        dir: PathBuf,
        target: &Path,
        staged: &mut BTreeSet<PathBuf>,
    ) -> Result<usize> {
        let (dir, build_files) = match catalog.dependency(import_path) {
            Some(listed) => (listed.source_dir.clone(), listed.build_files.as_slice()),
            None => (dir, [].as_slice()),
        };
        if !dir.is_dir() || !staged.insert(dir.clone()) {
            return Ok(0);
        }
        self.copy_package(&dir, target, build_files, &[])
    }

    fn copy_package(
        &self,
        src: &Path,
        dst: &Path,
        build_files: &[String],
        always: &[&str],
    ) -> Result<usize> {
        let options = CopyOptions {
            exclude: (!self.exclude.is_empty()).then_some(&self.exclude),
            preserve: build_files
                .iter()
                .map(String::as_str)
                .chain(always.iter().copied())
                .collect(),
        };

        copy_dir_files(src, dst, &options).map_err(|e| error::staging::copy_failed(src, e))
    }
}

/// `path` relative to `base`, tolerating symlinked spellings of either side
fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(base) {
        return Some(rel.to_path_buf());
    }
    let path = dunce::canonicalize(path).ok()?;
    let base = dunce::canonicalize(base).ok()?;
    path.strip_prefix(&base).ok().map(Path::to_path_buf)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    relative_to(a, b).is_some_and(|rel| rel.as_os_str().is_empty())
}
