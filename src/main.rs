//! covstage - install instrumented Go binaries
//!
//! A command line tool that builds Go binaries from an instrumented scratch copy
//! of the source tree and installs them where `go install` would.

use clap::Parser;
use console::Style;
use tracing_subscriber::EnvFilter;

use covstage::cli::{Cli, Commands};
use covstage::commands;

/// Environment variable holding the log filter
const LOG_ENV: &str = "COVSTAGE_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "covstage=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(cli.workspace, args, cli.verbose),
        Commands::Version => commands::version::run(),
    };

    if let Err(e) = result {
        let red = Style::new().red().bold();
        eprintln!("{} {}", red.apply_to("Error:"), e);
        if let Some(help) = miette::Diagnostic::help(&e) {
            eprintln!("  {help}");
        }
        std::process::exit(1);
    }
}
