//! Unit tests for the shared reconciliation state machine.

use super::*;
use crate::confirm::{ConfirmationGate, Prompter};
use crate::package_manager::PackageManagerKind;
use crate::platform::{OsKind, PlatformProfile};
use crate::test_utils::{ExpectedCall, ScriptedPrompter, StubDirs, StubDownloader, StubExecutor};
use rstest::rstest;
use tempfile::TempDir;

const PHP_OK: &str =
    r#"{"version":"8.4.3","extensions":["core","curl","mbstring","xml","zip","sqlite3"]}"#;
const PHP_NO_ZIP: &str =
    r#"{"version":"8.4.3","extensions":["core","curl","mbstring","xml","sqlite3"]}"#;

fn php_probe() -> ExpectedCall {
    ExpectedCall::new("php", &["-r", crate::test_utils::ANY_ARG])
}

struct Harness {
    _temp: TempDir,
    dirs: StubDirs,
    profile: PlatformProfile,
    manager: Option<Box<dyn PackageManager>>,
    downloader: StubDownloader,
}

impl Harness {
    fn new(kind: PackageManagerKind) -> Self {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        Self {
            _temp: temp,
            dirs,
            profile: PlatformProfile::new(OsKind::Linux, "x86_64", kind),
            manager: kind.manager(),
            downloader: StubDownloader::new(),
        }
    }

    fn ensure(
        &self,
        reconciler: &dyn Reconciler,
        executor: &StubExecutor,
        prompter: &dyn Prompter,
        non_interactive: bool,
    ) -> (Result<EnsureOutcome>, String) {
        let gate = ConfirmationGate::new(non_interactive, prompter);
        let ctx = ReconcileContext {
            profile: &self.profile,
            manager: self.manager.as_deref(),
            privilege: Privilege::Sudo,
            gate: &gate,
            executor,
            downloader: &self.downloader,
            dirs: &self.dirs,
        };
        let mut out = Vec::new();
        let result = {
            let mut reporter = Reporter::new(&mut out, false);
            ensure(reconciler, &ctx, &mut reporter)
        };
        (result, String::from_utf8(out).expect("utf-8 output"))
    }
}

#[rstest]
#[case(PackageManagerKind::Apt)]
#[case(PackageManagerKind::Dnf)]
#[case(PackageManagerKind::Yum)]
#[case(PackageManagerKind::Pacman)]
#[case(PackageManagerKind::Apk)]
#[case(PackageManagerKind::Homebrew)]
#[case(PackageManagerKind::Nix)]
#[case(PackageManagerKind::None)]
fn satisfied_dependencies_never_install(#[case] kind: PackageManagerKind) {
    let harness = Harness::new(kind);
    let executor = StubExecutor::new(vec![
        php_probe().stdout(PHP_OK),
        ExpectedCall::new("git", &["--version"]).stdout("git version 2.43.0\n"),
    ]);
    let prompter = ScriptedPrompter::interactive(&[]);

    let (php, _) = harness.ensure(&PhpReconciler, &executor, &prompter, false);
    let (git, output) = harness.ensure(&GitReconciler, &executor, &prompter, false);

    assert_eq!(php.expect("php satisfied"), EnsureOutcome::AlreadySatisfied);
    assert_eq!(git.expect("git satisfied"), EnsureOutcome::AlreadySatisfied);
    assert!(output.contains("git 2.43 found"));
    assert!(prompter.prompts().is_empty());
    executor.assert_finished();
}

#[test]
fn missing_git_is_installed_after_confirmation() {
    let harness = Harness::new(PackageManagerKind::Apt);
    let executor = StubExecutor::new(vec![
        ExpectedCall::new("git", &["--version"]).not_found(),
        ExpectedCall::new("sudo", &["apt-get", "update"]),
        ExpectedCall::new("sudo", &["apt-get", "install", "-y", "git"]),
    ]);
    let prompter = ScriptedPrompter::interactive(&["y"]);

    let (result, output) = harness.ensure(&GitReconciler, &executor, &prompter, false);

    assert_eq!(result.expect("git installed"), EnsureOutcome::Installed);
    assert_eq!(
        prompter.prompts(),
        vec!["Install git with `sudo apt-get install -y git`?"]
    );
    assert!(output.contains("warning: git is not installed"));
    executor.assert_finished();
}

#[test]
fn declined_install_reports_the_manual_command() {
    let harness = Harness::new(PackageManagerKind::Dnf);
    let executor = StubExecutor::new(vec![ExpectedCall::new("git", &["--version"]).not_found()]);
    let prompter = ScriptedPrompter::interactive(&["no"]);

    let (result, _) = harness.ensure(&GitReconciler, &executor, &prompter, false);

    match result.expect_err("declined") {
        InstallerError::MissingDependencyDeclined {
            dependency,
            remediation,
        } => {
            assert_eq!(dependency, "git");
            assert_eq!(remediation, "sudo dnf install -y git");
        }
        other => panic!("unexpected error: {other}"),
    }
    executor.assert_finished();
}

#[test]
fn no_package_manager_is_fatal_with_guidance() {
    let harness = Harness::new(PackageManagerKind::None);
    let executor = StubExecutor::new(vec![php_probe().not_found()]);
    let prompter = ScriptedPrompter::piped();

    let (result, _) = harness.ensure(&PhpReconciler, &executor, &prompter, true);

    let err = result.expect_err("no manager");
    assert!(matches!(
        err,
        InstallerError::PackageManagerUnavailable { dependency: "PHP", .. }
    ));
    assert!(err.remediation().is_some_and(|hint| hint.contains("php.net")));
}

#[test]
fn outdated_php_is_reinstalled_without_reprobe() {
    let harness = Harness::new(PackageManagerKind::Apt);
    let executor = StubExecutor::new(vec![
        php_probe().stdout(r#"{"version":"8.3.6","extensions":[]}"#),
        ExpectedCall::new("sudo", &["apt-get", "update"]),
        ExpectedCall::new(
            "sudo",
            &[
                "apt-get",
                "install",
                "-y",
                "php-cli",
                "php-curl",
                "php-mbstring",
                "php-xml",
                "php-zip",
                "php-sqlite3",
            ],
        ),
    ]);
    let prompter = ScriptedPrompter::piped();

    let (result, output) = harness.ensure(&PhpReconciler, &executor, &prompter, false);

    assert_eq!(result.expect("php installed"), EnsureOutcome::Installed);
    assert!(output.contains("PHP 8.3 found, 8.4 or newer is required"));
    executor.assert_finished();
}

#[rstest]
#[case::accept("y", true)]
#[case::decline("n", false)]
fn bundled_extension_gap_is_offered_to_the_operator(#[case] answer: &str, #[case] accepted: bool) {
    let harness = Harness::new(PackageManagerKind::Homebrew);
    let executor = StubExecutor::new(vec![
        php_probe().stdout(PHP_NO_ZIP),
        ExpectedCall::new("brew", &["install", "php"]),
        php_probe().stdout(PHP_NO_ZIP),
    ]);
    let prompter = ScriptedPrompter::interactive(&["y", answer]);

    let (result, _) = harness.ensure(&PhpReconciler, &executor, &prompter, false);

    if accepted {
        assert_eq!(
            result.expect("continued"),
            EnsureOutcome::InstalledWithGaps(vec!["zip".to_owned()])
        );
    } else {
        assert!(matches!(
            result.expect_err("declined"),
            InstallerError::MissingDependencyDeclined { dependency: "PHP", .. }
        ));
    }
    assert_eq!(prompter.prompts()[1], "Continue without the zip extensions?");
    executor.assert_finished();
}

#[test]
fn bundled_manager_reprobe_can_succeed() {
    let harness = Harness::new(PackageManagerKind::Pacman);
    let executor = StubExecutor::new(vec![
        php_probe().stdout(PHP_NO_ZIP),
        ExpectedCall::new("sudo", &["pacman", "-S", "--needed", "--noconfirm", "php", "php-sqlite"]),
        php_probe().stdout(PHP_OK),
    ]);
    let prompter = ScriptedPrompter::piped();

    let (result, _) = harness.ensure(&PhpReconciler, &executor, &prompter, false);

    assert_eq!(result.expect("php installed"), EnsureOutcome::Installed);
    executor.assert_finished();
}
