//! Instrumentation of mirrored packages
//!
//! Instrumentation rewrites the mirrored copy of every binary package before
//! it is built. covstage does not interpret what an engine does; it only needs
//! a successful report for every binary package before the build may start.

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::catalog::Package;
use crate::config::{StageConfig, ToolchainEnv};
use crate::error::{self, Result};
use crate::workspace::Workspace;

/// Variable that hands the coverage registry address to an external engine
pub const CENTER_ENV: &str = "COVSTAGE_CENTER";

/// Per-package outcome of an instrumentation engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationReport {
    pub import_path: String,
    pub success: bool,

    /// Source files of the package after instrumentation
    pub files: Vec<String>,

    /// Engine diagnostics, if any
    pub message: Option<String>,
}

/// An engine that rewrites mirrored binary packages in place
pub trait Instrumenter {
    fn name(&self) -> &str;

    /// Instrument every binary package; returns one report per binary package
    fn instrument(
        &self,
        workspace: &Workspace,
        packages: &[Package],
    ) -> Result<Vec<InstrumentationReport>>;
}

/// Pick the engine configured for a project
pub fn from_config(config: &StageConfig, env: &ToolchainEnv) -> Box<dyn Instrumenter> {
    if config.instrumenter.is_empty() {
        Box::new(PassThrough)
    } else {
        Box::new(
            ExternalInstrumenter::new(config.instrumenter.clone(), env.clone())
                .with_center(config.center.clone()),
        )
    }
}

/// Fail on the first unsuccessful report
pub fn ensure_instrumented(reports: &[InstrumentationReport]) -> Result<()> {
    match reports.iter().find(|r| !r.success) {
        Some(failed) => Err(error::build::instrumentation_failed(
            failed.import_path.clone(),
            failed
                .message
                .clone()
                .unwrap_or_else(|| "instrumentation did not succeed".to_string()),
        )),
        None => Ok(()),
    }
}

/// Leaves the mirrored copy untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl Instrumenter for PassThrough {
    fn name(&self) -> &str {
        "pass-through"
    }

    fn instrument(
        &self,
        _workspace: &Workspace,
        packages: &[Package],
    ) -> Result<Vec<InstrumentationReport>> {
        warn!("No instrumenter configured; binaries are built without instrumentation");

        Ok(packages
            .iter()
            .filter(|p| p.is_main())
            .map(|p| InstrumentationReport {
                import_path: p.import_path.clone(),
                success: true,
                files: p.build_files.clone(),
                message: None,
            })
            .collect())
    }
}

/// Runs an external command once per binary package
///
/// The mirrored package directory is appended to the configured command line
/// and the command runs from the scratch root. A configured registry address is
/// exported as `COVSTAGE_CENTER`.
#[derive(Debug, Clone)]
pub struct ExternalInstrumenter {
    command: Vec<String>,
    env: ToolchainEnv,
}

impl ExternalInstrumenter {
    pub fn new(command: Vec<String>, env: ToolchainEnv) -> Self {
        Self { command, env }
    }

    pub fn with_center(mut self, center: Option<String>) -> Self {
        if let Some(center) = center {
            self.env = self.env.with_var(CENTER_ENV, center);
        }
        self
    }

    fn run_one(&self, workspace: &Workspace, package: &Package, dir: &Path) -> InstrumentationReport {
        let report = |success: bool, message: Option<String>| InstrumentationReport {
            import_path: package.import_path.clone(),
            success,
            files: if success { source_files(dir) } else { Vec::new() },
            message,
        };

        let Some((program, args)) = self.command.split_first() else {
            return report(false, Some("empty instrumenter command".to_string()));
        };

        debug!(%program, package = %package.import_path, "instrumenting");

        match Command::new(program)
            .args(args)
            .arg(dir)
            .current_dir(workspace.root())
            .env_clear()
            .envs(self.env.vars())
            .output()
        {
            Ok(output) if output.status.success() => report(true, None),
            Ok(output) => {
                let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
                message.push_str(&String::from_utf8_lossy(&output.stderr));
                report(
                    false,
                    Some(format!("{program} exited with {}: {}", output.status, message.trim())),
                )
            }
            Err(e) => report(false, Some(format!("failed to run {program}: {e}"))),
        }
    }
}

impl Instrumenter for ExternalInstrumenter {
    fn name(&self) -> &str {
        self.command.first().map_or("external", String::as_str)
    }

    fn instrument(
        &self,
        workspace: &Workspace,
        packages: &[Package],
    ) -> Result<Vec<InstrumentationReport>> {
        packages
            .iter()
            .filter(|p| p.is_main())
            .map(|package| {
                let dir = package.mirrored_dir.as_deref().ok_or_else(|| {
                    error::build::instrumentation_failed(
                        package.import_path.clone(),
                        "package was not mirrored",
                    )
                })?;
                Ok(self.run_one(workspace, package, dir))
            })
            .collect()
    }
}

/// Go sources in `dir`, sorted
fn source_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".go"))
        .collect();
    files.sort();
    files
}
