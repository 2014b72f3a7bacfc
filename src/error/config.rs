//! Configuration errors

use std::path::Path;

use super::CovstageError;

pub fn read_failed(path: &Path, reason: impl ToString) -> CovstageError {
    CovstageError::ConfigReadFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

pub fn parse_failed(path: &Path, reason: impl ToString) -> CovstageError {
    CovstageError::ConfigParseFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

pub fn invalid(message: impl Into<String>) -> CovstageError {
    CovstageError::ConfigInvalid {
        message: message.into(),
    }
}
