//! Module and workspace file adjustments for the mirrored module
//!
//! `replace` directives in `go.mod` and `go.work`, and `use` directives in
//! `go.work`, may point at relative directories (`=> ../shared`, `use ../lib`)
//! resolved against the module root. Once the module root is moved into the
//! scratch workspace those paths would dangle, so they are rewritten to the
//! absolute location next to the original module. `use .` names the mirrored
//! module itself and is kept.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{self, Result};

/// Module file name
pub const GO_MOD: &str = "go.mod";

/// Workspace file name
pub const GO_WORK: &str = "go.work";

const REPLACE: &str = "replace";
const USE: &str = "use";
const ARROW: &str = "=>";

/// Directive whose arguments carry a local directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Replace,
    Use,
}

impl Directive {
    fn keyword(self) -> &'static str {
        match self {
            Self::Replace => REPLACE,
            Self::Use => USE,
        }
    }

    fn parse(line: &str) -> Option<(Self, &str)> {
        [Self::Replace, Self::Use].into_iter().find_map(|directive| {
            let rest = line.strip_prefix(directive.keyword())?;
            let trimmed = rest.trim_start();
            (trimmed.len() < rest.len() || trimmed.starts_with('('))
                .then_some((directive, trimmed))
        })
    }
}

/// Rewrite relative directories in `go.mod` and `go.work` below `scratch_module_root`
///
/// Missing files are skipped.
pub fn rewrite_relative_paths(scratch_module_root: &Path, original_module_dir: &Path) -> Result<()> {
    for name in [GO_MOD, GO_WORK] {
        let path = scratch_module_root.join(name);
        if !path.is_file() {
            continue;
        }

        let content =
            fs::read_to_string(&path).map_err(|e| error::staging::copy_failed(&path, e))?;
        let rewritten = rewrite_directives(&content, original_module_dir);

        if rewritten != content {
            debug!(path = %path.display(), "rewrote relative directory directives");
            fs::write(&path, rewritten).map_err(|e| error::staging::copy_failed(&path, e))?;
        }
    }

    Ok(())
}

/// Rewrite every relative `replace` and `use` directory in `content` against `module_dir`
pub fn rewrite_directives(content: &str, module_dir: &Path) -> String {
    let mut block: Option<Directive> = None;
    let mut out = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();

        let in_block = block.is_some();
        let directive = if let Some(current) = block {
            if trimmed.starts_with(')') {
                block = None;
                None
            } else if trimmed.starts_with("//") {
                None
            } else {
                Some(current)
            }
        } else if let Some((directive, rest)) = Directive::parse(trimmed) {
            if rest.starts_with('(') {
                block = Some(directive);
                None
            } else {
                Some(directive)
            }
        } else {
            None
        };

        match directive {
            Some(Directive::Replace) => out.push_str(&rewrite_replace(line, module_dir)),
            Some(Directive::Use) => out.push_str(&rewrite_use(line, module_dir, in_block)),
            None => out.push_str(line),
        }
    }

    out
}

fn rewrite_replace(line: &str, module_dir: &Path) -> String {
    let Some(arrow) = line.find(ARROW) else {
        return line.to_string();
    };
    let (head, tail) = line.split_at(arrow + ARROW.len());
    rewrite_first_path(head, tail, module_dir, false)
}

/// `use ./dir` on one line, or `./dir` inside a `use ( ... )` block
fn rewrite_use(line: &str, module_dir: &Path, in_block: bool) -> String {
    let indent = line.len() - line.trim_start().len();
    let split = if in_block { indent } else { indent + USE.len() };
    let (head, tail) = line.split_at(split);
    rewrite_first_path(head, tail, module_dir, true)
}

/// Rewrite the first whitespace-separated token of `tail` when it is a
/// relative directory
fn rewrite_first_path(head: &str, tail: &str, module_dir: &Path, keep_current: bool) -> String {
    let leading = tail.len() - tail.trim_start().len();
    let (spacing, target) = tail.split_at(leading);
    let end = target
        .find(char::is_whitespace)
        .unwrap_or(target.len());
    let (token, rest) = target.split_at(end);

    let (quoted, raw) = match token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => (true, inner),
        None => (false, token),
    };

    if !is_relative_dir(raw) || (keep_current && is_current_dir(raw)) {
        return format!("{head}{tail}");
    }

    let absolute = clean_join(module_dir, raw).to_string_lossy().into_owned();
    let replacement = if quoted || absolute.contains(char::is_whitespace) {
        format!("\"{absolute}\"")
    } else {
        absolute
    };

    format!("{head}{spacing}{replacement}{rest}")
}

/// Local directories must start with `./` or `../`
fn is_relative_dir(target: &str) -> bool {
    is_current_dir(target)
        || target == ".."
        || target.starts_with("./")
        || target.starts_with("../")
        || target.starts_with(".\\")
        || target.starts_with("..\\")
}

fn is_current_dir(target: &str) -> bool {
    matches!(target, "." | "./" | ".\\")
}

/// Join `rel` onto `base` and fold `.`/`..` components lexically
fn clean_join(base: &Path, rel: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in base.join(rel).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
