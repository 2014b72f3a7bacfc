//! Install destination errors

use std::path::Path;

use super::CovstageError;

/// Creates an unresolved install path error for a package
pub fn unresolved(
    package: impl Into<String>,
    attempted: Option<&Path>,
    reason: impl Into<String>,
) -> CovstageError {
    CovstageError::UnresolvedInstallPath {
        package: package.into(),
        attempted: attempted.map(|p| p.display().to_string()),
        reason: reason.into(),
    }
}
