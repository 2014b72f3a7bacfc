//! Path utilities shared by the catalog and the mirror
//!
//! Import paths always use `/` regardless of platform, so conversions between
//! import identities and filesystem locations go through these helpers.

use std::path::{Path, PathBuf};

/// Convert an import path (`example.com/app/cmd/tool`) into a relative path
pub fn import_path_to_relative(import_path: &str) -> PathBuf {
    import_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Part of `import_path` below `prefix`, if `import_path` lives inside it.
///
/// Returns `Some("")` when both are equal.
///
/// ```
/// use covstage::path_utils::strip_import_prefix;
///
/// assert_eq!(strip_import_prefix("example.com/app/cmd", "example.com/app"), Some("cmd"));
/// assert_eq!(strip_import_prefix("example.com/app", "example.com/app"), Some(""));
/// assert_eq!(strip_import_prefix("example.com/application", "example.com/app"), None);
/// ```
pub fn strip_import_prefix<'a>(import_path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = import_path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Canonical spelling of `path`, even when it does not exist yet
///
/// The deepest existing ancestor is canonicalized (resolving symlinks) and the
/// missing components are appended unchanged.
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = dunce::canonicalize(existing) {
            return missing.iter().rev().fold(canonical, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
