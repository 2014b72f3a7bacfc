//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod install;

pub use install::InstallArgs;

/// covstage - build Go binaries from an instrumented copy of the source tree
///
/// Installs binaries exactly where `go install` would put them, while the
/// original source tree stays untouched.
#[derive(Parser, Debug)]
#[command(
    name = "covstage",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install instrumented Go binaries without touching the source tree",
    long_about = "covstage mirrors the packages a build needs into a scratch workspace, \
                  instruments the copy, and runs `go install` there so every binary lands \
                  in the directory a plain `go install` would have used.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  covstage install                        \x1b[90m# Install the package in the current directory\x1b[0m\n   \
                  covstage install ./cmd/...              \x1b[90m# Install every command of the module\x1b[0m\n   \
                  covstage install . --install-dir ./bin  \x1b[90m# Install into an explicit directory\x1b[0m\n   \
                  covstage install ./... -- -tags e2e     \x1b[90m# Pass build flags through\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(long, short = 'w', global = true, env = "COVSTAGE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and install instrumented binaries
    Install(InstallArgs),

    /// Show version information
    Version,
}
