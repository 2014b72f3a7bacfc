//! Package listing through `go list -json`
//!
//! The toolchain prints one JSON object per matched package, concatenated
//! without separators. Only the fields the catalog and the mirror need are
//! decoded; everything else is ignored.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::config::ToolchainEnv;
use crate::error::{self, Result};

/// A module as reported by the toolchain
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListedModule {
    pub path: String,
    pub dir: PathBuf,
    pub main: bool,
}

/// Per-package load error
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListedError {
    pub err: String,
}

/// One package entry of `go list -json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListedPackage {
    pub dir: PathBuf,
    pub import_path: String,
    pub name: String,
    pub target: String,
    pub root: String,
    pub module: Option<ListedModule>,
    pub deps: Vec<String>,
    pub go_files: Vec<String>,
    pub cgo_files: Vec<String>,
    pub c_files: Vec<String>,
    #[serde(rename = "CXXFiles")]
    pub cxx_files: Vec<String>,
    pub h_files: Vec<String>,
    pub s_files: Vec<String>,
    pub syso_files: Vec<String>,
    pub embed_files: Vec<String>,
    pub ignored_go_files: Vec<String>,
    pub error: Option<ListedError>,
}

impl ListedPackage {
    /// Files the build may reference, relative to the package directory
    pub fn build_files(&self) -> Vec<String> {
        let mut files: Vec<String> = [
            &self.go_files,
            &self.cgo_files,
            &self.c_files,
            &self.cxx_files,
            &self.h_files,
            &self.s_files,
            &self.syso_files,
            &self.embed_files,
            &self.ignored_go_files,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
        files.sort();
        files.dedup();
        files
    }
}

/// Decode the concatenated JSON stream printed by `go list -json`
pub fn parse_listing(output: &[u8]) -> Result<Vec<ListedPackage>> {
    serde_json::Deserializer::from_slice(output)
        .into_iter::<ListedPackage>()
        .map(|item| item.map_err(Into::into))
        .collect()
}

/// Source of package listings for a build target expression
pub trait PackageLister {
    fn list(
        &self,
        root: &Path,
        targets: &[String],
        flags: &[String],
        env: &ToolchainEnv,
    ) -> Result<Vec<ListedPackage>>;
}

/// Lists packages by running the Go toolchain
#[derive(Debug, Clone)]
pub struct GoList {
    program: String,
}

impl GoList {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PackageLister for GoList {
    fn list(
        &self,
        root: &Path,
        targets: &[String],
        flags: &[String],
        env: &ToolchainEnv,
    ) -> Result<Vec<ListedPackage>> {
        debug!(program = %self.program, root = %root.display(), ?targets, "listing packages");

        let output = Command::new(&self.program)
            .arg("list")
            .arg("-json")
            .args(flags)
            .args(targets)
            .current_dir(root)
            .env_clear()
            .envs(env.vars())
            .output()
            .map_err(|e| error::build::spawn_failed(&self.program, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(error::catalog::list_failed(format!(
                "{} list exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_listing(&output.stdout)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CovstageError;

    const MODULE_LISTING: &str = r#"{
	"Dir": "/src/app/cmd/server",
	"ImportPath": "example.com/app/cmd/server",
	"Name": "main",
	"Target": "/home/dev/go/bin/server",
	"Root": "/src/app",
	"Module": {
		"Path": "example.com/app",
		"Main": true,
		"Dir": "/src/app",
		"GoMod": "/src/app/go.mod",
		"GoVersion": "1.22"
	},
	"GoFiles": ["main.go"],
	"EmbedFiles": ["static/index.html"],
	"Deps": ["example.com/app/internal/db", "fmt"]
}
{
	"Dir": "/src/app/internal/db",
	"ImportPath": "example.com/app/internal/db",
	"Name": "db",
	"Root": "/src/app",
	"Module": {"Path": "example.com/app", "Main": true, "Dir": "/src/app"},
	"GoFiles": ["db.go"],
	"CXXFiles": ["shim.cc"],
	"Deps": ["fmt"]
}
"#;

    #[test]
    fn test_parse_listing_stream() {
        let packages = parse_listing(MODULE_LISTING.as_bytes()).expect("parse");
        assert_eq!(packages.len(), 2);

        let server = &packages[0];
        assert_eq!(server.import_path, "example.com/app/cmd/server");
        assert_eq!(server.name, "main");
        assert_eq!(server.target, "/home/dev/go/bin/server");
        let module = server.module.as_ref().expect("module");
        assert_eq!(module.path, "example.com/app");
        assert!(module.main);
        assert_eq!(server.embed_files, vec!["static/index.html"]);

        assert_eq!(packages[1].cxx_files, vec!["shim.cc"]);
        assert!(packages[1].target.is_empty());
    }

    #[test]
    fn test_parse_listing_empty() {
        assert!(parse_listing(b"").expect("parse").is_empty());
        assert!(parse_listing(b"  \n").expect("parse").is_empty());
    }

    #[test]
    fn test_parse_listing_malformed() {
        let result = parse_listing(b"{\"ImportPath\": ");
        assert!(matches!(
            result,
            Err(CovstageError::PackageListFailed { .. })
        ));
    }

    #[test]
    fn test_parse_listing_package_error() {
        let packages = parse_listing(
            br#"{"ImportPath": "example.com/app/broken", "Error": {"Err": "no Go files"}}"#,
        )
        .expect("parse");
        assert_eq!(
            packages[0].error.as_ref().map(|e| e.err.as_str()),
            Some("no Go files")
        );
    }

    #[test]
    fn test_build_files_are_sorted_and_unique() {
        let pkg = ListedPackage {
            go_files: vec!["b.go".into(), "a.go".into()],
            ignored_go_files: vec!["a.go".into(), "windows.go".into()],
            embed_files: vec!["assets/logo.png".into()],
            ..Default::default()
        };
        assert_eq!(
            pkg.build_files(),
            vec!["a.go", "assets/logo.png", "b.go", "windows.go"]
        );
    }

    #[test]
    fn test_go_list_missing_program() {
        let lister = GoList::new("covstage-no-such-toolchain");
        let result = lister.list(
            Path::new("."),
            &[".".to_string()],
            &[],
            &ToolchainEnv::default(),
        );
        assert!(matches!(
            result,
            Err(CovstageError::ToolchainSpawnFailed { .. })
        ));
    }
}
