//! Version command implementation
//!
//! Besides the crate version, reports the Go toolchain a request in the
//! current directory would use, as configured in `covstage.yaml`.

use std::env;
use std::process::Command;

use crate::config::StageConfig;
use crate::config::stage::DEFAULT_TOOLCHAIN;
use crate::error::Result;

/// Run version command
pub fn run() -> Result<()> {
    let toolchain = env::current_dir()
        .ok()
        .and_then(|cwd| StageConfig::load(&cwd, None).ok())
        .map_or_else(|| DEFAULT_TOOLCHAIN.to_string(), |config| config.toolchain);

    println!("{}", report(&toolchain, toolchain_version(&toolchain).as_deref()));
    Ok(())
}

fn report(toolchain: &str, toolchain_version: Option<&str>) -> String {
    let profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    format!(
        "covstage {}\n\nBuild info:\n  Minimum Rust: {}\n  Profile: {profile}\n\nToolchain:\n  {toolchain}: {}",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_RUST_VERSION"),
        toolchain_version.unwrap_or("not found"),
    )
}

/// First line of `<toolchain> version`, when the toolchain runs
fn toolchain_version(toolchain: &str) -> Option<String> {
    let output = Command::new(toolchain).arg("version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}
