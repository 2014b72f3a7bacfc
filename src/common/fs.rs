//! Common file system operations used while mirroring
//!
//! Symbolic links are always followed: the mirror holds regular files and
//! directories only.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use crate::error::{self, Result};

/// Glob patterns for files that are left out of a mirrored package
#[derive(Debug, Default)]
pub struct ExcludeSet {
    globs: Vec<Glob<'static>>,
}

impl ExcludeSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let globs = patterns
            .iter()
            .map(|pattern| {
                Glob::new(pattern).map(Glob::into_owned).map_err(|e| {
                    error::config::invalid(format!("Invalid exclude pattern '{pattern}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { globs })
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    /// Whether `rel` (relative to the package directory, `/`-separated) is excluded
    pub fn is_excluded(&self, rel: &str) -> bool {
        let candidate = CandidatePath::from(rel);
        self.globs
            .iter()
            .any(|glob| glob.matched(&candidate).is_some())
    }
}

#[derive(Default)]
pub struct CopyOptions<'a> {
    pub exclude: Option<&'a ExcludeSet>,
    /// Relative paths that are copied even when excluded
    pub preserve: BTreeSet<&'a str>,
}

/// Copy the regular files of `src` into `dst` without descending
///
/// Preserved paths that live in subdirectories (embedded assets) are copied
/// as well. Returns the number of files written.
pub fn copy_dir_files(src: &Path, dst: &Path, options: &CopyOptions<'_>) -> io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let entry_path = entry.path();

        // Broken links cannot take part in a build.
        let Ok(metadata) = fs::metadata(&entry_path) else {
            continue;
        };
        if metadata.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if !options.preserve.contains(name.as_ref())
            && options.exclude.is_some_and(|set| set.is_excluded(&name))
        {
            continue;
        }

        fs::copy(&entry_path, dst.join(&file_name))?;
        copied += 1;
    }

    for rel in options.preserve.iter().filter(|rel| rel.contains('/')) {
        copy_file(
            &src.join(crate::path_utils::import_path_to_relative(rel)),
            &dst.join(crate::path_utils::import_path_to_relative(rel)),
        )?;
        copied += 1;
    }

    Ok(copied)
}

/// Copy a directory tree recursively
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Copy one file, creating the destination's parent directories
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}
