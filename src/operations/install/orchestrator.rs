//! Main orchestrator for the install operation
//!
//! ```text
//! Idle -> Staged -> Instrumented -> Resolved -> Invoked -> Succeeded | Failed -> CleanedUp
//! ```
//!
//! Listing happens before anything is staged, so a request that matches no
//! package (or no binary) never creates a scratch workspace or spawns a build.
//! Once staged, the workspace is removed exactly once, after the last build
//! subprocess has exited, whatever the outcome.

use std::fs;

use tracing::{debug, info, warn};

use crate::catalog::{PackageCatalog, PackageLister};
use crate::error::{self, Result};
use crate::installer::instrument::{self, InstrumentationReport, Instrumenter};
use crate::installer::{BuildInvoker, InvocationResult};
use crate::resolver::{InstallLocationResolver, InstallPlan};
use crate::workspace::{PathMirror, Workspace};

use super::{InstallOutcome, InstallRequest, Stage};

struct Built {
    plan: InstallPlan,
    reports: Vec<InstrumentationReport>,
}

/// Receives every state transition of a request
pub trait StageObserver {
    fn on_stage(&self, stage: Stage);
}

/// Drives one install request end to end
pub struct Orchestrator<'a> {
    lister: &'a dyn PackageLister,
    instrumenter: &'a dyn Instrumenter,
    observer: Option<&'a dyn StageObserver>,
    history: Vec<Stage>,
    invocations: Vec<InvocationResult>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(lister: &'a dyn PackageLister, instrumenter: &'a dyn Instrumenter) -> Self {
        Self {
            lister,
            instrumenter,
            observer: None,
            history: vec![Stage::Idle],
            invocations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn StageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// States visited so far
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    /// Build subprocesses run so far
    ///
    /// Kept when a later destination group fails, so callers can tell which
    /// binaries were already installed.
    pub fn invocations(&self) -> &[InvocationResult] {
        &self.invocations
    }

    /// Run `request` to completion
    pub fn run(&mut self, request: &InstallRequest) -> Result<InstallOutcome> {
        let root = &request.original_root;
        fs::read_dir(root).map_err(|e| error::staging::root_unreadable(root, e))?;

        let targets = request.effective_targets();
        let mut catalog = PackageCatalog::load(
            self.lister,
            root,
            &targets,
            &request.build_flags,
            &request.env,
        )?;

        let mirror = PathMirror::new(&request.config.exclude)?;
        let workspace = mirror.stage(&mut catalog, root, &request.effective_scratch_base())?;
        self.transition(Stage::Staged);

        let built = self.build(&workspace, &catalog, request);
        if let Err(e) = &built {
            debug!(category = ?e.category(), "install failed: {e}");
            self.transition(Stage::Failed);
        }

        let cleanup_warning = match workspace.cleanup() {
            Ok(()) => None,
            Err(e) => {
                warn!("{e}");
                Some(e.to_string())
            }
        };
        self.transition(Stage::CleanedUp);

        let Built { plan, reports } = built?;
        Ok(InstallOutcome {
            plan,
            reports,
            invocations: self.invocations.clone(),
            history: self.history.clone(),
            cleanup_warning,
        })
    }

    fn build(
        &mut self,
        workspace: &Workspace,
        catalog: &PackageCatalog,
        request: &InstallRequest,
    ) -> Result<Built> {
        debug!(engine = self.instrumenter.name(), "instrumenting mirrored packages");
        let reports = self.instrumenter.instrument(workspace, catalog.packages())?;
        instrument::ensure_instrumented(&reports)?;
        self.transition(Stage::Instrumented);

        let plan = InstallLocationResolver::new(&request.env)
            .with_explicit_dir(request.install_dir.as_deref())
            .resolve(catalog)?;
        self.transition(Stage::Resolved);

        let invoker = BuildInvoker::new(
            &request.config.toolchain,
            &request.build_flags,
            &request.env,
        );
        for group in plan.groups() {
            let result = invoker.invoke(workspace, group);
            let failure = result.to_error(invoker.program());
            self.invocations.push(result);

            if let Some(err) = failure {
                for done in self.invocations.iter().filter(|r| r.success) {
                    warn!(
                        install_dir = %done.install_dir.display(),
                        "binaries were installed before a later build failed"
                    );
                }
                self.transition(Stage::Invoked);
                return Err(err);
            }
        }
        self.transition(Stage::Invoked);

        for dir in plan.install_dirs() {
            info!(install_dir = %dir.display(), "binaries installed");
        }
        self.transition(Stage::Succeeded);

        Ok(Built { plan, reports })
    }

    fn transition(&mut self, stage: Stage) {
        debug!(%stage, "install state");
        self.history.push(stage);
        if let Some(observer) = self.observer {
            observer.on_stage(stage);
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::ListedPackage;
    use crate::config::ToolchainEnv;
    use crate::error::CovstageError;
    use crate::installer::instrument::PassThrough;
    use crate::test_fixtures::{create_module_tree, create_temp_dir, module_package};
    use std::cell::RefCell;
    use std::path::Path;

    const MODULE: &str = "example.com/app";

    struct FixedLister(Vec<ListedPackage>);

    impl PackageLister for FixedLister {
        fn list(
            &self,
            _root: &Path,
            _targets: &[String],
            _flags: &[String],
            _env: &ToolchainEnv,
        ) -> Result<Vec<ListedPackage>> {
            Ok(self.0.clone())
        }
    }

    struct FailingInstrumenter;

    impl Instrumenter for FailingInstrumenter {
        fn name(&self) -> &str {
            "failing"
        }

        fn instrument(
            &self,
            _workspace: &Workspace,
            packages: &[crate::catalog::Package],
        ) -> Result<Vec<InstrumentationReport>> {
            Ok(packages
                .iter()
                .filter(|p| p.is_main())
                .map(|p| InstrumentationReport {
                    import_path: p.import_path.clone(),
                    success: false,
                    files: Vec::new(),
                    message: Some("cannot parse main.go".to_string()),
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Stage>>);

    impl StageObserver for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.0.borrow_mut().push(stage);
        }
    }

    fn is_empty_dir(path: &Path) -> bool {
        fs::read_dir(path).expect("read dir").next().is_none()
    }

    #[test]
    fn test_zero_matches_fails_before_staging() {
        let (_project, root) = create_module_tree(MODULE);
        let scratch = create_temp_dir();
        let lister = FixedLister(Vec::new());
        let request = InstallRequest::new(&root, ToolchainEnv::default())
            .with_scratch_base(Some(scratch.path().to_path_buf()));

        let mut orchestrator = Orchestrator::new(&lister, &PassThrough);
        let result = orchestrator.run(&request);

        assert!(matches!(result, Err(CovstageError::NoPackagesMatched { .. })));
        assert_eq!(orchestrator.history(), [Stage::Idle]);
        assert!(is_empty_dir(scratch.path()));
    }

    #[test]
    fn test_unreadable_root_is_a_staging_error() {
        let scratch = create_temp_dir();
        let lister = FixedLister(Vec::new());
        let request = InstallRequest::new(scratch.path().join("missing"), ToolchainEnv::default())
            .with_scratch_base(Some(scratch.path().to_path_buf()));

        let result = Orchestrator::new(&lister, &PassThrough).run(&request);

        assert!(matches!(result, Err(CovstageError::RootUnreadable { .. })));
        assert!(is_empty_dir(scratch.path()));
    }

    #[test]
    fn test_instrumentation_failure_cleans_up() {
        let (_project, root) = create_module_tree(MODULE);
        let scratch = create_temp_dir();
        let lister = FixedLister(vec![module_package(&root, MODULE, "cmd/server", "main")]);
        let request = InstallRequest::new(&root, ToolchainEnv::default())
            .with_scratch_base(Some(scratch.path().to_path_buf()));
        let recorder = Recorder::default();

        let mut orchestrator =
            Orchestrator::new(&lister, &FailingInstrumenter).with_observer(&recorder);
        let result = orchestrator.run(&request);

        assert!(matches!(
            result,
            Err(CovstageError::InstrumentationFailed { .. })
        ));
        assert_eq!(
            orchestrator.history(),
            [Stage::Idle, Stage::Staged, Stage::Failed, Stage::CleanedUp]
        );
        assert_eq!(
            *recorder.0.borrow(),
            vec![Stage::Staged, Stage::Failed, Stage::CleanedUp]
        );
        assert!(is_empty_dir(scratch.path()));
    }

    #[test]
    fn test_missing_toolchain_fails_after_resolution() {
        let (_project, root) = create_module_tree(MODULE);
        let scratch = create_temp_dir();
        let bin = create_temp_dir();
        let lister = FixedLister(vec![module_package(&root, MODULE, "cmd/server", "main")]);
        let mut config = crate::config::StageConfig::default();
        config.toolchain = "covstage-no-such-toolchain".to_string();
        let request = InstallRequest::new(&root, ToolchainEnv::default())
            .with_install_dir(Some(bin.path().to_path_buf()))
            .with_scratch_base(Some(scratch.path().to_path_buf()))
            .with_config(config);

        let mut orchestrator = Orchestrator::new(&lister, &PassThrough);
        let result = orchestrator.run(&request);

        assert!(matches!(
            result,
            Err(CovstageError::ToolchainSpawnFailed { .. })
        ));
        assert_eq!(
            orchestrator.history(),
            [
                Stage::Idle,
                Stage::Staged,
                Stage::Instrumented,
                Stage::Resolved,
                Stage::Invoked,
                Stage::Failed,
                Stage::CleanedUp
            ]
        );
        assert!(is_empty_dir(scratch.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_group_keeps_earlier_invocations() {
        use std::os::unix::fs::PermissionsExt;

        let (_project, root) = create_module_tree(MODULE);
        let scratch = create_temp_dir();
        let bins = create_temp_dir();
        let tools = create_temp_dir();
        let script = tools.path().join("go");
        fs::write(
            &script,
            "#!/bin/sh\ncase \"$GOBIN\" in\n  *fail*) echo \"cannot build\" >&2; exit 1 ;;\nesac\necho ok\n",
        )
        .expect("write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");

        let ok_dir = bins.path().join("a-ok");
        let fail_dir = bins.path().join("b-fail");
        let mut server = module_package(&root, MODULE, "cmd/server", "main");
        server.target = ok_dir.join("server").display().to_string();
        let mut agent = module_package(&root, MODULE, "cmd/agent", "main");
        agent.target = fail_dir.join("agent").display().to_string();
        let lister = FixedLister(vec![server, agent]);

        let mut config = crate::config::StageConfig::default();
        config.toolchain = script.display().to_string();
        let request = InstallRequest::new(&root, ToolchainEnv::default())
            .with_scratch_base(Some(scratch.path().to_path_buf()))
            .with_config(config);

        let mut orchestrator = Orchestrator::new(&lister, &PassThrough);
        let result = orchestrator.run(&request);

        assert!(matches!(result, Err(CovstageError::BuildFailure { .. })));
        let invocations = orchestrator.invocations();
        assert_eq!(invocations.len(), 2);
        assert!(invocations[0].success);
        assert_eq!(invocations[0].install_dir, ok_dir);
        assert!(!invocations[1].success);
        assert_eq!(invocations[1].output, "cannot build\n");
        assert!(is_empty_dir(scratch.path()));
    }
}
