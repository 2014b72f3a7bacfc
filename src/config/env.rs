//! Toolchain environment snapshot
//!
//! The CLI captures the process environment once; the pipeline only ever reads
//! this snapshot and hands an explicit variable list to the subprocess.

use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Output-redirect variable of the Go toolchain
pub const GOBIN: &str = "GOBIN";

/// Workspace-root variable of the Go toolchain (path-based resolution)
pub const GOPATH: &str = "GOPATH";

/// Default GOPATH directory under the user's home
pub const DEFAULT_GOPATH_DIR: &str = "go";

/// Binary directory inside a GOPATH entry
pub const BIN_DIR: &str = "bin";

/// Request-scoped view of the environment the toolchain would see
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainEnv {
    vars: BTreeMap<OsString, OsString>,
    home: Option<PathBuf>,
}

impl ToolchainEnv {
    /// Snapshot the current process environment and home directory
    pub fn capture() -> Self {
        Self {
            vars: env::vars_os().collect(),
            home: dirs::home_dir(),
        }
    }

    /// Build an environment from explicit variables (no home directory)
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            home: None,
        }
    }

    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn without_var(mut self, key: &str) -> Self {
        self.vars.remove(OsStr::new(key));
        self
    }

    /// Value of a variable; empty values count as unset, like the toolchain does
    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars
            .get(OsStr::new(key))
            .map(OsString::as_os_str)
            .filter(|v| !v.is_empty())
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Configured GOBIN, as given (may be relative)
    pub fn gobin(&self) -> Option<PathBuf> {
        self.get(GOBIN).map(PathBuf::from)
    }

    /// GOPATH entries in order; falls back to `<home>/go` when unset
    pub fn gopath_entries(&self) -> Vec<PathBuf> {
        match self.get(GOPATH) {
            Some(value) => env::split_paths(value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            None => self
                .home
                .iter()
                .map(|home| home.join(DEFAULT_GOPATH_DIR))
                .collect(),
        }
    }

    /// `<home>/go/bin`, the well-known per-user binary directory
    pub fn default_user_bin_dir(&self) -> Option<PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(DEFAULT_GOPATH_DIR).join(BIN_DIR))
    }

    /// All variables, in a stable order
    pub fn vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}
