//! Package catalog errors

use super::CovstageError;

/// Joins a target expression for display
fn describe_targets(targets: &[String]) -> String {
    if targets.is_empty() {
        ".".to_string()
    } else {
        targets.join(" ")
    }
}

pub fn no_packages(targets: &[String]) -> CovstageError {
    CovstageError::NoPackagesMatched {
        target: describe_targets(targets),
    }
}

pub fn no_binaries(targets: &[String]) -> CovstageError {
    CovstageError::NoBinaryPackages {
        target: describe_targets(targets),
    }
}

pub fn list_failed(reason: impl Into<String>) -> CovstageError {
    CovstageError::PackageListFailed {
        reason: reason.into(),
    }
}

pub fn package_broken(import_path: impl Into<String>, reason: impl Into<String>) -> CovstageError {
    CovstageError::PackageBroken {
        import_path: import_path.into(),
        reason: reason.into(),
    }
}
