//! Project configuration (covstage.yaml)
//!
//! ```yaml
//! toolchain: go
//! exclude:
//!   - "**/*.md"
//!   - "docs/**"
//! instrumenter: ["goc-cover"]
//! center: http://127.0.0.1:7777
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::fs::ExcludeSet;
use crate::error::{self, Result};

/// Config filename looked up in the original root
pub const CONFIG_FILE: &str = "covstage.yaml";

/// Default toolchain program
pub const DEFAULT_TOOLCHAIN: &str = "go";

/// Settings shared by every install request for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    /// Toolchain program used for listing and installing
    pub toolchain: String,

    /// Globs (relative to a package directory) for files not worth mirroring
    pub exclude: Vec<String>,

    /// Command run once per binary package to instrument its mirrored copy
    pub instrumenter: Vec<String>,

    /// Coverage registry the instrumented binaries report to
    pub center: Option<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_string(),
            exclude: Vec::new(),
            instrumenter: Vec::new(),
            center: None,
        }
    }
}

impl StageConfig {
    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.toolchain.trim().is_empty() {
            return Err(error::config::invalid("'toolchain' must not be empty"));
        }

        ExcludeSet::new(&self.exclude)?;

        if self
            .instrumenter
            .first()
            .is_some_and(|program| program.trim().is_empty())
        {
            return Err(error::config::invalid(
                "'instrumenter' must start with a program name",
            ));
        }

        if self
            .center
            .as_deref()
            .is_some_and(|center| center.trim().is_empty())
        {
            return Err(error::config::invalid("'center' must not be empty"));
        }

        Ok(())
    }

    /// Load configuration for a project
    ///
    /// An explicit path must exist. Otherwise `covstage.yaml` in `root` is used
    /// when present, and defaults apply when it is not.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content =
            fs::read_to_string(&path).map_err(|e| error::config::read_failed(&path, e))?;

        Self::from_yaml(&content).map_err(|e| match e {
            crate::error::CovstageError::ConfigParseFailed { reason, .. } => {
                error::config::parse_failed(&path, reason)
            }
            other => other,
        })
    }
}
