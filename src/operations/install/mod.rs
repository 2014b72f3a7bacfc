//! Install operation
//!
//! An install request is staged into a scratch workspace, instrumented,
//! resolved to its native install directories and built there. See
//! [`orchestrator::Orchestrator`] for the state machine.

pub mod orchestrator;

use std::fmt;
use std::path::PathBuf;

use crate::config::{StageConfig, ToolchainEnv};
use crate::installer::InvocationResult;
use crate::installer::instrument::InstrumentationReport;
use crate::resolver::InstallPlan;

pub use orchestrator::{Orchestrator, StageObserver};

/// Target used when a request names none
pub const DEFAULT_TARGET: &str = ".";

/// Everything one install request needs, captured up front
///
/// Nothing in the pipeline reads process-wide state; two requests in one
/// process never share a working directory or environment.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// The real source tree (module root, a directory inside it, or a GOPATH package)
    pub original_root: PathBuf,

    /// Build target expression: a path, a wildcard, or explicit packages
    pub targets: Vec<String>,

    /// Flags passed to the toolchain verbatim
    pub build_flags: Vec<String>,

    /// Install every binary here instead of its native directory
    pub install_dir: Option<PathBuf>,

    /// Where to create the scratch workspace
    pub scratch_base: Option<PathBuf>,

    /// Environment snapshot for listing, instrumenting and building
    pub env: ToolchainEnv,

    pub config: StageConfig,
}

impl InstallRequest {
    pub fn new(original_root: impl Into<PathBuf>, env: ToolchainEnv) -> Self {
        Self {
            original_root: original_root.into(),
            targets: Vec::new(),
            build_flags: Vec::new(),
            install_dir: None,
            scratch_base: None,
            env,
            config: StageConfig::default(),
        }
    }

    #[must_use]
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    #[must_use]
    pub fn with_build_flags(mut self, flags: Vec<String>) -> Self {
        self.build_flags = flags;
        self
    }

    #[must_use]
    pub fn with_install_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.install_dir = dir;
        self
    }

    #[must_use]
    pub fn with_scratch_base(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_base = dir;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: StageConfig) -> Self {
        self.config = config;
        self
    }

    /// Targets, defaulting to the current package
    pub fn effective_targets(&self) -> Vec<String> {
        if self.targets.is_empty() {
            vec![DEFAULT_TARGET.to_string()]
        } else {
            self.targets.clone()
        }
    }

    /// Scratch base, defaulting to the safe temp location
    pub fn effective_scratch_base(&self) -> PathBuf {
        self.scratch_base
            .clone()
            .unwrap_or_else(crate::temp::temp_dir_base)
    }
}

/// Pipeline states of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Staged,
    Instrumented,
    Resolved,
    Invoked,
    Succeeded,
    Failed,
    CleanedUp,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Staged => "staged",
            Self::Instrumented => "instrumented",
            Self::Resolved => "resolved",
            Self::Invoked => "invoked",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::CleanedUp => "cleaned up",
        };
        write!(f, "{name}")
    }
}

/// Result of a successful install request
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub plan: InstallPlan,
    pub reports: Vec<InstrumentationReport>,
    pub invocations: Vec<InvocationResult>,

    /// Every state the request went through, in order
    pub history: Vec<Stage>,

    /// Set when the scratch workspace could not be removed
    pub cleanup_warning: Option<String>,
}
