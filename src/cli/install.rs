use clap::Parser;
use std::path::PathBuf;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install the package in the current directory:\n    covstage install\n\n\
                   Install every command of a module:\n    covstage install ./cmd/...\n\n\
                   Install into an explicit directory:\n    covstage install ./... --install-dir /opt/bin\n\n\
                   Pass flags through to go install:\n    covstage install ./... -- -tags e2e -trimpath")]
pub struct InstallArgs {
    /// Packages to install: a path, a wildcard pattern, or import paths (defaults to ".")
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Install every binary into this directory instead of its native location
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Configuration file (defaults to covstage.yaml in the project directory)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Coverage registry address handed to the instrumenter (overrides `center` in the config)
    #[arg(long, value_name = "URL")]
    pub center: Option<String>,

    /// Directory for scratch workspaces (defaults to COVSTAGE_TMPDIR or the system temp dir)
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Flags passed verbatim to `go install`
    #[arg(last = true, value_name = "FLAGS", allow_hyphen_values = true)]
    pub build_flags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> InstallArgs {
        let cli = super::super::Cli::try_parse_from(args).unwrap_or_else(|e| {
            panic!("Failed to parse CLI arguments: {}", e);
        });
        match cli.command {
            super::super::Commands::Install(args) => args,
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_defaults() {
        let args = parse(&["covstage", "install"]);
        assert!(args.targets.is_empty());
        assert!(args.install_dir.is_none());
        assert!(args.center.is_none());
        assert!(args.build_flags.is_empty());
    }

    #[test]
    fn test_cli_parsing_install_targets_and_flags() {
        let args = parse(&[
            "covstage",
            "install",
            "./cmd/...",
            "example.com/app/tools/gen",
            "--install-dir",
            "/opt/bin",
            "--",
            "-tags",
            "e2e",
            "-trimpath",
        ]);
        assert_eq!(args.targets, vec!["./cmd/...", "example.com/app/tools/gen"]);
        assert_eq!(args.install_dir, Some(PathBuf::from("/opt/bin")));
        assert_eq!(args.build_flags, vec!["-tags", "e2e", "-trimpath"]);
    }

    #[test]
    fn test_cli_parsing_install_config_and_scratch() {
        let args = parse(&[
            "covstage",
            "install",
            "-c",
            "ci/covstage.yaml",
            "--scratch-dir",
            "/var/tmp",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("ci/covstage.yaml")));
        assert_eq!(args.scratch_dir, Some(PathBuf::from("/var/tmp")));
    }

    #[test]
    fn test_cli_parsing_install_center() {
        let args = parse(&["covstage", "install", "--center", "http://10.0.0.5:7777"]);
        assert_eq!(args.center.as_deref(), Some("http://10.0.0.5:7777"));
    }
}
