//! Test fixtures and utilities for reducing test setup duplication.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{create_temp_dir, create_module_tree, module_package};
//!
//! #[test]
//! fn my_test() {
//!     let temp = create_temp_dir();
//!     let (project, root) = create_module_tree("example.com/app");
//!     let server = module_package(&root, "example.com/app", "cmd/server", "main");
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::catalog::{ListedModule, ListedPackage};

/// Create a temp directory in the system temp location.
///
/// Uses `crate::temp::temp_dir_base()` to ensure temp dirs are never
/// created under the current working directory.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::temp_dir_base()).expect("Failed to create temp directory")
}

/// Write `content` to `root/rel`, creating parent directories.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, content).expect("Failed to write file");
    path
}

/// Create a small module on disk:
///
/// ```text
/// go.mod, go.sum, README.md
/// cmd/server/main.go, cmd/server/server_test.go
/// cmd/agent/main.go
/// internal/db/db.go
/// vendor/github.com/acme/log/log.go
/// docs/guide.md
/// ```
///
/// Returns the `TempDir` guard and the canonical module root.
///
/// # Panics
///
/// Panics if any file cannot be written.
#[must_use]
pub fn create_module_tree(module_path: &str) -> (TempDir, PathBuf) {
    let temp = create_temp_dir();
    let root = dunce::canonicalize(temp.path()).expect("Failed to canonicalize temp dir");

    write_file(&root, "go.mod", &format!("module {module_path}\n\ngo 1.22\n"));
    write_file(&root, "go.sum", "");
    write_file(&root, "README.md", "# app\n");
    write_file(&root, "cmd/server/main.go", "package main\n");
    write_file(&root, "cmd/server/server_test.go", "package main\n");
    write_file(&root, "cmd/agent/main.go", "package main\n");
    write_file(&root, "internal/db/db.go", "package db\n");
    write_file(&root, "vendor/github.com/acme/log/log.go", "package log\n");
    write_file(&root, "docs/guide.md", "guide\n");

    (temp, root)
}

/// A module-mode listing entry for `<module_path>/<rel>` living in `<module_dir>/<rel>`.
///
/// An empty `rel` denotes the package at the module root.
#[must_use]
pub fn module_package(
    module_dir: impl AsRef<Path>,
    module_path: &str,
    rel: &str,
    name: &str,
) -> ListedPackage {
    let module_dir = module_dir.as_ref();
    let (dir, import_path) = if rel.is_empty() {
        (module_dir.to_path_buf(), module_path.to_string())
    } else {
        (module_dir.join(rel), format!("{module_path}/{rel}"))
    };

    ListedPackage {
        dir,
        import_path,
        name: name.to_string(),
        module: Some(ListedModule {
            path: module_path.to_string(),
            dir: module_dir.to_path_buf(),
            main: true,
        }),
        go_files: vec![go_file_for(name)],
        ..Default::default()
    }
}

/// A GOPATH-mode listing entry for `import_path` under the GOPATH entry `root`.
#[must_use]
pub fn gopath_package(root: impl AsRef<Path>, import_path: &str, name: &str) -> ListedPackage {
    let root = root.as_ref();
    ListedPackage {
        dir: root.join("src").join(import_path),
        import_path: import_path.to_string(),
        name: name.to_string(),
        root: root.display().to_string(),
        go_files: vec![go_file_for(name)],
        ..Default::default()
    }
}

fn go_file_for(name: &str) -> String {
    if name == crate::catalog::MAIN_PACKAGE {
        "main.go".to_string()
    } else {
        format!("{name}.go")
    }
}
