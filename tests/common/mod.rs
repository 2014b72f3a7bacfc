//! Common test utilities for covstage integration tests
//!
//! [`FakeGo`] is a shell script standing in for the Go toolchain:
//! - `list` prints the JSON stream stored in `FAKE_GO_LISTING`
//! - `install` appends one line per call to `FAKE_GO_LOG` (environment,
//!   working directory and the full argument list, subcommand included) and
//!   exits with `FAKE_GO_EXIT` (default 0)

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use covstage::config::{StageConfig, ToolchainEnv};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const MODULE: &str = "example.com/app";

/// Output the fake toolchain prints when asked to fail
pub const COMPILE_ERROR: &str = "compile error: ./main.go:3: undefined: x\n";

const FAKE_GO_SCRIPT: &str = r#"#!/bin/sh
cmd="$1"
shift
case "$cmd" in
  list)
    while IFS= read -r line || [ -n "$line" ]; do
      printf '%s\n' "$line"
    done < "$FAKE_GO_LISTING"
    ;;
  install)
    printf 'GOBIN=%s|GOPATH=%s|PWD=%s|ARGS=%s\n' "${GOBIN-}" "${GOPATH-<unset>}" "$(pwd -P)" "$cmd $*" >> "$FAKE_GO_LOG"
    if [ -n "${FAKE_GO_EXPECT-}" ] && [ -f "$FAKE_GO_EXPECT" ]; then
      echo "instrumented $FAKE_GO_EXPECT"
    fi
    if [ "${FAKE_GO_EXIT-0}" != "0" ]; then
      printf 'compile error: ./main.go:3: undefined: x\n' >&2
      exit "$FAKE_GO_EXIT"
    fi
    echo "built $*"
    ;;
  *)
    echo "unsupported command: $cmd" >&2
    exit 64
    ;;
esac
"#;

/// One recorded `install` call of the fake toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub gobin: String,
    pub gopath: Option<String>,
    pub pwd: PathBuf,
    pub args: String,
}

/// A fake Go toolchain living in its own temp directory
pub struct FakeGo {
    pub dir: TempDir,
    pub program: PathBuf,
    pub listing: PathBuf,
    pub log: PathBuf,
}

impl FakeGo {
    #[cfg(unix)]
    pub fn new() -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create temp directory");
        let program = dir.path().join("go");
        fs::write(&program, FAKE_GO_SCRIPT).expect("Failed to write fake toolchain");
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake toolchain executable");

        let listing = dir.path().join("listing.json");
        fs::write(&listing, "").expect("Failed to write listing");

        Self {
            log: dir.path().join("install.log"),
            program,
            listing,
            dir,
        }
    }

    /// Store the packages `list` reports
    pub fn set_listing(&self, packages: &[Value]) {
        let stream: Vec<String> = packages
            .iter()
            .map(|p| serde_json::to_string_pretty(p).expect("Failed to serialize listing"))
            .collect();
        fs::write(&self.listing, stream.join("\n")).expect("Failed to write listing");
    }

    /// Every recorded `install` call, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        let Ok(content) = fs::read_to_string(&self.log) else {
            return Vec::new();
        };
        content
            .lines()
            .map(|line| {
                let fields: Vec<&str> = line.splitn(4, '|').collect();
                let value = |i: usize, key: &str| {
                    fields[i]
                        .strip_prefix(key)
                        .expect("Malformed log line")
                        .to_string()
                };
                let gopath = value(1, "GOPATH=");
                Invocation {
                    gobin: value(0, "GOBIN="),
                    gopath: (gopath != "<unset>").then_some(gopath),
                    pwd: PathBuf::from(value(2, "PWD=")),
                    args: value(3, "ARGS="),
                }
            })
            .collect()
    }

    /// Configuration pointing at this toolchain
    pub fn config(&self) -> StageConfig {
        StageConfig {
            toolchain: self.program.display().to_string(),
            ..StageConfig::default()
        }
    }

    /// Environment for a request: inherited variables minus Go settings, plus
    /// the fake toolchain's own variables
    pub fn env(&self, home: &Path) -> ToolchainEnv {
        ToolchainEnv::capture()
            .without_var("GOBIN")
            .without_var("GOPATH")
            .without_var("GOFLAGS")
            .with_home(home)
            .with_var("FAKE_GO_LISTING", &self.listing)
            .with_var("FAKE_GO_LOG", &self.log)
    }
}

/// A module on disk with two commands and one library
pub struct TestProject {
    pub temp: TempDir,
    pub root: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = dunce::canonicalize(temp.path()).expect("Failed to canonicalize");
        let project = Self { temp, root };

        project.write_file("go.mod", &format!("module {MODULE}\n\ngo 1.22\n"));
        project.write_file("go.sum", "");
        project.write_file("cmd/server/main.go", "package main\n");
        project.write_file("cmd/agent/main.go", "package main\n");
        project.write_file("cmd/worker/main.go", "package main\n");
        project.write_file("internal/db/db.go", "package db\n");
        project
    }

    /// Write a file in the project
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.root.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    /// A `go list -json` entry for `<MODULE>/<rel>`
    pub fn package(&self, rel: &str, name: &str) -> Value {
        json!({
            "Dir": self.root.join(rel),
            "ImportPath": format!("{MODULE}/{rel}"),
            "Name": name,
            "Module": {"Path": MODULE, "Dir": self.root, "Main": true},
            "GoFiles": [if name == "main" { "main.go".to_string() } else { format!("{name}.go") }],
            "Deps": ["fmt"],
        })
    }

    /// A binary entry whose native install target lives in `bin_dir`
    pub fn binary_in(&self, rel: &str, bin_dir: &Path) -> Value {
        let mut value = self.package(rel, "main");
        let name = rel.rsplit('/').next().unwrap_or(rel);
        value["Target"] = json!(bin_dir.join(name));
        value
    }
}

/// Whether `path` is an empty directory
pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// A temp directory with a canonical path
pub fn canonical_temp_dir() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let path = dunce::canonicalize(temp.path()).expect("Failed to canonicalize");
    (temp, path)
}
