//! Toolchain invocation for staged workspaces
//!
//! This module handles:
//! - Building the explicit environment for each build subprocess
//! - Running `<toolchain> install` once per destination group
//! - Capturing combined output for reporting
//! - The instrumentation seam run before anything is built ([`instrument`])
//!
//! The process environment is never modified; each subprocess receives a
//! cleared environment rebuilt from the request's [`ToolchainEnv`] snapshot.

pub mod instrument;

use std::env;
use std::ffi::OsString;
use std::iter;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, error};

use crate::catalog::ResolutionMode;
use crate::config::ToolchainEnv;
use crate::config::env::{GOBIN, GOPATH};
use crate::error::{self, CovstageError};
use crate::resolver::DestinationGroup;
use crate::workspace::Workspace;

/// Toolchain subcommand that builds and installs binaries
pub const INSTALL_SUBCOMMAND: &str = "install";

/// Outcome of one build subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// Destination this invocation wrote to
    pub install_dir: PathBuf,

    /// Arguments passed to the toolchain, subcommand included
    pub args: Vec<String>,

    pub success: bool,

    /// Exit status, when the process ran
    pub status: Option<ExitStatus>,

    /// Standard output followed by standard error
    pub output: String,

    /// Why the process could not be run at all
    pub error: Option<String>,
}

impl InvocationResult {
    /// The error this result stands for, if it failed
    pub fn to_error(&self, program: &str) -> Option<CovstageError> {
        if let Some(reason) = &self.error {
            return Some(error::build::spawn_failed(program, reason.clone()));
        }
        if self.success {
            return None;
        }

        let status = self
            .status
            .map_or_else(|| "unknown status".to_string(), |s| s.to_string());
        Some(error::build::build_failure(
            program,
            &self.args,
            status,
            self.output.clone(),
        ))
    }

    fn spawn_error(install_dir: &Path, args: Vec<String>, reason: String) -> Self {
        Self {
            install_dir: install_dir.to_path_buf(),
            args,
            success: false,
            status: None,
            output: String::new(),
            error: Some(reason),
        }
    }
}

/// Runs the toolchain's install subcommand inside a workspace
#[derive(Debug, Clone, Copy)]
pub struct BuildInvoker<'a> {
    program: &'a str,
    flags: &'a [String],
    env: &'a ToolchainEnv,
}

impl<'a> BuildInvoker<'a> {
    /// `flags` are passed through verbatim, ahead of the targets
    pub fn new(program: &'a str, flags: &'a [String], env: &'a ToolchainEnv) -> Self {
        Self {
            program,
            flags,
            env,
        }
    }

    pub fn program(&self) -> &str {
        self.program
    }

    /// Arguments for one destination group
    pub fn args(&self, group: &DestinationGroup) -> Vec<String> {
        iter::once(INSTALL_SUBCOMMAND.to_string())
            .chain(self.flags.iter().cloned())
            .chain(group.targets.iter().cloned())
            .collect()
    }

    /// The complete environment of the subprocess for one destination
    ///
    /// `GOBIN` is always set. In GOPATH mode `GOPATH` is replaced by the
    /// scratch root followed by the original entries; in module mode the
    /// inherited `GOPATH` passes through so the module cache stays the same.
    pub fn environment(
        &self,
        workspace: &Workspace,
        install_dir: &Path,
    ) -> Result<Vec<(OsString, OsString)>, env::JoinPathsError> {
        let gopath_mode = workspace.mode() == ResolutionMode::GoPath;
        let mut vars: Vec<(OsString, OsString)> = self
            .env
            .vars()
            .filter(|(key, _)| *key != GOBIN && !(gopath_mode && *key == GOPATH))
            .map(|(k, v)| (k.to_os_string(), v.to_os_string()))
            .collect();

        vars.push((GOBIN.into(), install_dir.as_os_str().to_os_string()));

        if gopath_mode {
            let entries = iter::once(workspace.root().to_path_buf())
                .chain(self.env.gopath_entries());
            vars.push((GOPATH.into(), env::join_paths(entries)?));
        }

        Ok(vars)
    }

    /// Build and install one destination group
    ///
    /// Blocks until the subprocess has exited and both streams are drained.
    pub fn invoke(&self, workspace: &Workspace, group: &DestinationGroup) -> InvocationResult {
        let args = self.args(group);

        let vars = match self.environment(workspace, &group.install_dir) {
            Ok(vars) => vars,
            Err(e) => {
                return InvocationResult::spawn_error(
                    &group.install_dir,
                    args,
                    format!("cannot build {GOPATH}: {e}"),
                );
            }
        };

        debug!(
            program = self.program,
            ?args,
            cwd = %workspace.working_dir().display(),
            install_dir = %group.install_dir.display(),
            "invoking toolchain"
        );

        let output = match Command::new(self.program)
            .args(&args)
            .current_dir(workspace.working_dir())
            .env_clear()
            .envs(vars)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                error!(program = self.program, "failed to start toolchain: {e}");
                return InvocationResult::spawn_error(&group.install_dir, args, e.to_string());
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(status = %output.status, "toolchain exited");

        InvocationResult {
            install_dir: group.install_dir.clone(),
            args,
            success: output.status.success(),
            status: Some(output.status),
            output: combined,
            error: None,
        }
    }
}
