//! Scratch workspace management
//!
//! This module handles:
//! - Creating a uniquely named scratch root per request
//! - Mirroring the packages a request needs into it ([`mirror`])
//! - Rewriting module files so the copy still resolves local replacements ([`gomod`])
//! - Removing the scratch root exactly once
//!
//! ## Scratch Layout
//!
//! ```text
//! <scratch base>/covstage-<hash>-XXXXXX/
//! ├── go.mod, go.sum        # module mode: module root maps to the scratch root
//! ├── vendor/               # module mode, when present
//! ├── cmd/server/...
//! └── src/<import path>/    # GOPATH mode: flat import-path layout
//! ```

pub mod gomod;
pub mod mirror;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::catalog::{ModuleInfo, ResolutionMode};
use crate::error::{self, Result};
use crate::hash;
use crate::path_utils;

pub use crate::catalog::GOPATH_SRC_DIR;
pub use mirror::PathMirror;

/// Prefix of every scratch root
pub const SCRATCH_PREFIX: &str = "covstage-";

/// An isolated copy of the buildable tree
///
/// The scratch root is owned exclusively by this value. [`Workspace::cleanup`]
/// removes it and reports failures; dropping an un-cleaned workspace removes
/// it as well, so every exit path releases the directory.
#[derive(Debug)]
pub struct Workspace {
    scratch: Option<TempDir>,
    root: PathBuf,
    original_root: PathBuf,
    mode: ResolutionMode,
    working_dir: PathBuf,
}

impl Workspace {
    /// Create a fresh scratch root for `original_root` under `base`
    ///
    /// `base` is compared with `original_root` after resolving symlinks, so a
    /// base reached through a link into the original tree is rejected too.
    pub fn create(original_root: &Path, mode: ResolutionMode, base: &Path) -> Result<Self> {
        if path_utils::canonicalize_lenient(base)
            .starts_with(path_utils::canonicalize_lenient(original_root))
        {
            return Err(error::staging::copy_failed(
                base,
                "scratch base must not be inside the original root",
            ));
        }

        fs::create_dir_all(base).map_err(|e| error::staging::copy_failed(base, e))?;

        let prefix = format!(
            "{SCRATCH_PREFIX}{}-",
            hash::short_path_hash(original_root)
        );
        let scratch = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(base)
            .map_err(|e| error::staging::copy_failed(base, e))?;
        let root = scratch.path().to_path_buf();

        debug!(scratch = %root.display(), %mode, "scratch workspace created");

        Ok(Self {
            scratch: Some(scratch),
            working_dir: root.clone(),
            root,
            original_root: original_root.to_path_buf(),
            mode,
        })
    }

    /// Scratch root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The real source tree this workspace mirrors
    pub fn original_root(&self) -> &Path {
        &self.original_root
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// The original root re-based into the scratch root
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub(crate) fn set_working_dir(&mut self, dir: PathBuf) {
        self.working_dir = dir;
    }

    /// Where a package with `import_path` lives inside the scratch root
    ///
    /// GOPATH mode uses `<root>/src/<import path>`; module mode maps the module
    /// root onto the scratch root. Returns `None` for a module-mode import path
    /// outside the given module.
    pub fn mirror_path(&self, import_path: &str, module: Option<&ModuleInfo>) -> Option<PathBuf> {
        match (self.mode, module) {
            (ResolutionMode::GoPath, _) => Some(
                self.root
                    .join(GOPATH_SRC_DIR)
                    .join(path_utils::import_path_to_relative(import_path)),
            ),
            (ResolutionMode::Module, Some(module)) => {
                path_utils::strip_import_prefix(import_path, &module.path)
                    .map(|rest| self.root.join(path_utils::import_path_to_relative(rest)))
            }
            (ResolutionMode::Module, None) => None,
        }
    }

    /// Remove the scratch root
    pub fn cleanup(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        let Some(scratch) = self.scratch.take() else {
            return Ok(());
        };

        scratch
            .close()
            .map_err(|e| error::staging::cleanup_failed(&self.root, e))?;
        debug!(scratch = %self.root.display(), "scratch workspace removed");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("{e}");
        }
    }
}
