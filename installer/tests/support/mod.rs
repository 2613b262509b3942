//! Test support utilities for installer integration tests.
//!
//! [`Host`] is a scratch machine: stub directories under a temporary root,
//! a fixed platform profile and a run configuration whose install root lives
//! inside the scratch data directory. Command, download and prompt stubs are
//! supplied per run.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use camino::Utf8PathBuf;
use coqui_installer::confirm::{ConfirmationGate, Prompter};
use coqui_installer::error::Result;
use coqui_installer::output::Reporter;
use coqui_installer::package_manager::{PackageManager, PackageManagerKind};
use coqui_installer::pipeline::{RunSummary, run_install};
use coqui_installer::platform::{OsKind, PlatformProfile};
use coqui_installer::privilege::Privilege;
use coqui_installer::reconcile::ReconcileContext;
use coqui_installer::run_config::{DEFAULT_REPO_URL, InstallMode, RunConfig};
use coqui_installer::test_utils::{ANY_ARG, ExpectedCall, StubDirs, StubDownloader, StubExecutor};
use tempfile::TempDir;

/// PHP probe output for a host that satisfies every requirement.
pub const PHP_OK: &str =
    r#"{"version":"8.4.3","extensions":["core","curl","mbstring","xml","zip","sqlite3"]}"#;

/// A scratch host.
pub struct Host {
    _temp: TempDir,
    pub dirs: StubDirs,
    pub profile: PlatformProfile,
    pub manager: Option<Box<dyn PackageManager>>,
    pub privilege: Privilege,
    pub config: RunConfig,
}

impl Host {
    /// A Linux host managed by `kind`, running as root, non-interactive.
    pub fn linux(kind: PackageManagerKind) -> Self {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        let data = Utf8PathBuf::try_from(dirs.data()).expect("utf-8 temp dir");
        Self {
            _temp: temp,
            dirs,
            profile: PlatformProfile::new(OsKind::Linux, "x86_64", kind),
            manager: kind.manager(),
            privilege: Privilege::Root,
            config: RunConfig {
                mode: InstallMode::Full,
                non_interactive: true,
                quiet: false,
                repo_url: DEFAULT_REPO_URL.to_owned(),
                install_root: data.join("coqui"),
                version_pin: None,
            },
        }
    }

    /// Install root as a string, for building expected command lines.
    pub fn root(&self) -> String {
        self.config.install_root.to_string()
    }

    /// Runs the pipeline and returns its result with everything reported.
    pub fn run(
        &self,
        executor: &StubExecutor,
        downloader: &StubDownloader,
        prompter: &dyn Prompter,
    ) -> (Result<RunSummary>, String) {
        let gate = ConfirmationGate::new(self.config.non_interactive, prompter);
        let ctx = ReconcileContext {
            profile: &self.profile,
            manager: self.manager.as_deref(),
            privilege: self.privilege,
            gate: &gate,
            executor,
            downloader,
            dirs: &self.dirs,
        };
        let mut out = Vec::new();
        let result = {
            let mut reporter = Reporter::new(&mut out, self.config.quiet);
            run_install(&self.config, &ctx, &mut reporter)
        };
        (result, String::from_utf8(out).expect("utf-8 output"))
    }
}

/// `php -r <probe>` answering with `stdout`.
pub fn php_probe(stdout: &str) -> ExpectedCall {
    ExpectedCall::new("php", &["-r", ANY_ARG]).stdout(stdout)
}

/// `php -r <probe>` on a host without PHP.
pub fn php_absent() -> ExpectedCall {
    ExpectedCall::new("php", &["-r", ANY_ARG]).not_found()
}

/// `<composer> install` with production flags.
pub fn composer_install(composer: &str, root: &str) -> ExpectedCall {
    ExpectedCall::new(
        composer,
        &[
            "install",
            "--no-interaction",
            "--no-dev",
            "--optimize-autoloader",
            "--working-dir",
            root,
        ],
    )
}
