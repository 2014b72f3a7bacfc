//! Error types and handling for covstage
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`staging`]: Scratch workspace and mirroring errors
//! - [`catalog`]: Package listing errors
//! - [`install_path`]: Install destination errors
//! - [`build`]: Instrumentation and toolchain invocation errors
//! - [`config`]: Configuration errors

pub mod build;
pub mod catalog;
pub mod config;
pub mod install_path;
pub mod staging;


use miette::Diagnostic;
use thiserror::Error;

/// Main error type for covstage operations
#[derive(Error, Diagnostic, Debug)]
pub enum CovstageError {
    // Staging errors
    #[error("Cannot read original root '{path}': {reason}")]
    #[diagnostic(
        code(covstage::staging::root_unreadable),
        help("Check that the directory exists and is readable")
    )]
    RootUnreadable { path: String, reason: String },

    #[error("Failed to stage '{path}' into scratch workspace: {reason}")]
    #[diagnostic(code(covstage::staging::copy_failed))]
    StagingFailed { path: String, reason: String },

    #[error("Original root '{path}' is outside of '{parent}'")]
    #[diagnostic(
        code(covstage::staging::outside_project),
        help("Run covstage from inside the module or GOPATH project directory")
    )]
    OutsideProject { path: String, parent: String },

    // Catalog errors
    #[error("No packages matched '{target}'")]
    #[diagnostic(
        code(covstage::catalog::no_packages),
        help("Check the package pattern, e.g. '.', './...' or './cmd/...'")
    )]
    NoPackagesMatched { target: String },

    #[error("Packages matched '{target}', but none of them is a main package")]
    #[diagnostic(
        code(covstage::catalog::no_binaries),
        help("Only main packages produce binaries that can be installed")
    )]
    NoBinaryPackages { target: String },

    #[error("Failed to list packages: {reason}")]
    #[diagnostic(code(covstage::catalog::list_failed))]
    PackageListFailed { reason: String },

    #[error("Package '{import_path}' cannot be loaded: {reason}")]
    #[diagnostic(code(covstage::catalog::package_error))]
    PackageBroken { import_path: String, reason: String },

    // Install path errors
    #[error("Cannot determine install directory for '{package}': {reason}")]
    #[diagnostic(
        code(covstage::install_path::unresolved),
        help("Pass --install-dir or set GOBIN to an absolute directory")
    )]
    UnresolvedInstallPath {
        package: String,
        attempted: Option<String>,
        reason: String,
    },

    // Build errors
    #[error("Instrumentation failed for '{package}': {reason}")]
    #[diagnostic(code(covstage::build::instrumentation_failed))]
    InstrumentationFailed { package: String, reason: String },

    #[error("Failed to execute: {program} {args} ({status})\n{output}")]
    #[diagnostic(code(covstage::build::failed))]
    BuildFailure {
        program: String,
        args: String,
        status: String,
        output: String,
    },

    #[error("Failed to start '{program}': {reason}")]
    #[diagnostic(
        code(covstage::build::spawn_failed),
        help("Make sure the Go toolchain is installed and on PATH, or set 'toolchain' in covstage.yaml")
    )]
    ToolchainSpawnFailed { program: String, reason: String },

    // Cleanup errors
    #[error("Failed to remove scratch workspace '{path}': {reason}")]
    #[diagnostic(code(covstage::cleanup::failed))]
    CleanupFailed { path: String, reason: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(covstage::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(covstage::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(covstage::config::invalid))]
    ConfigInvalid { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(covstage::fs::io_error))]
    IoError { message: String },
}

/// Coarse classification used by the reporting layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Staging,
    Catalog,
    UnresolvedInstallPath,
    Instrumentation,
    Build,
    Cleanup,
    Config,
    Io,
}

impl CovstageError {
    /// Category of this error within the install pipeline
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RootUnreadable { .. }
            | Self::StagingFailed { .. }
            | Self::OutsideProject { .. } => ErrorCategory::Staging,
            Self::NoPackagesMatched { .. }
            | Self::NoBinaryPackages { .. }
            | Self::PackageListFailed { .. }
            | Self::PackageBroken { .. } => ErrorCategory::Catalog,
            Self::UnresolvedInstallPath { .. } => ErrorCategory::UnresolvedInstallPath,
            Self::InstrumentationFailed { .. } => ErrorCategory::Instrumentation,
            Self::BuildFailure { .. } | Self::ToolchainSpawnFailed { .. } => ErrorCategory::Build,
            Self::CleanupFailed { .. } => ErrorCategory::Cleanup,
            Self::ConfigReadFailed { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigInvalid { .. } => ErrorCategory::Config,
            Self::IoError { .. } => ErrorCategory::Io,
        }
    }
}

impl From<std::io::Error> for CovstageError {
    fn from(err: std::io::Error) -> Self {
        CovstageError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CovstageError {
    fn from(err: serde_yaml::Error) -> Self {
        CovstageError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CovstageError {
    fn from(err: serde_json::Error) -> Self {
        CovstageError::PackageListFailed {
            reason: format!("malformed package listing: {err}"),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, CovstageError>;
