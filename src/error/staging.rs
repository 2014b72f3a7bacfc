//! Staging errors

use std::path::Path;

use super::CovstageError;

/// Creates an unreadable original root error
pub fn root_unreadable(path: &Path, reason: impl ToString) -> CovstageError {
    CovstageError::RootUnreadable {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a copy failure error for a path being mirrored
pub fn copy_failed(path: &Path, reason: impl ToString) -> CovstageError {
    CovstageError::StagingFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates an error for a working directory that is not inside the project
pub fn outside_project(path: &Path, parent: &Path) -> CovstageError {
    CovstageError::OutsideProject {
        path: path.display().to_string(),
        parent: parent.display().to_string(),
    }
}

/// Creates a cleanup failure error
pub fn cleanup_failed(path: &Path, reason: impl ToString) -> CovstageError {
    CovstageError::CleanupFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
