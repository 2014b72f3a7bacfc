//! Install command implementation
//!
//! The installation process:
//! 1. Resolve the project directory and load `covstage.yaml`
//! 2. Snapshot the toolchain environment
//! 3. Run the install pipeline behind a spinner
//! 4. Print exactly one terminal message

use std::env;
use std::path::{Path, PathBuf};

use console::Style;

use crate::catalog::GoList;
use crate::cli::InstallArgs;
use crate::config::{StageConfig, ToolchainEnv};
use crate::error::{CovstageError, Result};
use crate::installer::instrument;
use crate::operations::install::{InstallOutcome, InstallRequest, Orchestrator};
use crate::progress::ProgressDisplay;

/// Run install command
pub fn run(workspace: Option<PathBuf>, args: InstallArgs, verbose: bool) -> Result<()> {
    let cwd = env::current_dir().map_err(|e| CovstageError::IoError {
        message: format!("Failed to get current directory: {}", e),
    })?;

    let root = absolutize(&cwd, workspace.unwrap_or_else(|| cwd.clone()));
    let mut config = StageConfig::load(&root, args.config.as_deref())?;
    if args.center.is_some() {
        config.center = args.center;
        config.validate()?;
    }
    let env = ToolchainEnv::capture();

    let request = InstallRequest::new(&root, env)
        .with_targets(args.targets)
        .with_build_flags(args.build_flags)
        .with_install_dir(args.install_dir.map(|dir| absolutize(&cwd, dir)))
        .with_scratch_base(args.scratch_dir.map(|dir| absolutize(&cwd, dir)))
        .with_config(config);

    let lister = GoList::new(request.config.toolchain.clone());
    let instrumenter = instrument::from_config(&request.config, &request.env);
    // Log lines and the spinner would interleave on stderr.
    let progress = ProgressDisplay::new(verbose);

    let outcome = Orchestrator::new(&lister, instrumenter.as_ref())
        .with_observer(&progress)
        .run(&request);
    progress.finish();

    println!("{}", success_message(&outcome?));
    Ok(())
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// The terminal message for a successful request
fn success_message(outcome: &InstallOutcome) -> String {
    let green = Style::new().green().bold();
    let dim = Style::new().dim();
    let groups = outcome.plan.groups();

    match groups {
        [group] => format!(
            "{} Installed {} into {}",
            green.apply_to("✔"),
            binaries(group.packages.len()),
            group.install_dir.display()
        ),
        _ => {
            let mut message = format!("{} Installed binaries into:", green.apply_to("✔"));
            for group in groups {
                message.push_str(&format!(
                    "\n  {} {}",
                    group.install_dir.display(),
                    dim.apply_to(format!("({})", binaries(group.packages.len())))
                ));
            }
            message
        }
    }
}

fn binaries(count: usize) -> String {
    if count == 1 {
        "1 binary".to_string()
    } else {
        format!("{count} binaries")
    }
}
