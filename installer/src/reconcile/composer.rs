//! Composer reconciler.
//!
//! Composer is not taken from the package manager: distribution packages
//! lag behind and pull in their own PHP. The official installer script is
//! downloaded instead, verified against its published SHA-384 signature and
//! only then executed.

use super::{Assessment, ReconcileContext, Reconciler};
use crate::bin_dir::{Placement, is_writable, placements};
use crate::download::{COMPOSER_INSTALLER_URL, COMPOSER_SIGNATURE_URL};
use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, failure_message};
use crate::integrity::{Sha384Digest, verify_payload};
use crate::output::Reporter;
use crate::requirement::{COMPOSER, PHP, RequirementSpec};
use crate::version::Version;
use log::{debug, warn};
use std::path::{Path, PathBuf};

const INSTALLER_ARTEFACT: &str = "Composer installer";

/// Finds an installed `composer`.
///
/// Looks on the search path first, then in the directories the installer
/// itself places Composer in, so a re-run finds a user-local install even
/// when that directory is not on `PATH` yet.
pub fn locate_composer(ctx: &ReconcileContext<'_>) -> Option<PathBuf> {
    ctx.executor.which(COMPOSER.binary).or_else(|| {
        [ctx.dirs.system_bin_dir(), ctx.dirs.user_bin_dir()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(COMPOSER.binary))
            .find(|candidate| candidate.is_file())
    })
}

/// Ensures Composer at the minimum version.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposerReconciler;

impl Reconciler for ComposerReconciler {
    fn spec(&self) -> &'static RequirementSpec {
        &COMPOSER
    }

    fn assess(&self, ctx: &ReconcileContext<'_>) -> Result<Assessment> {
        let Some(path) = locate_composer(ctx) else {
            return Ok(Assessment::Missing);
        };
        let program = path.to_string_lossy();
        let output = ctx.executor.run(&program, &["--version", "--no-ansi"])?;
        if !output.status.success() {
            return Err(InstallerError::DependencyProbe {
                dependency: COMPOSER.name,
                reason: failure_message(&output),
            });
        }
        let banner = String::from_utf8_lossy(&output.stdout);
        let found = Version::find_in(&banner).ok_or_else(|| InstallerError::DependencyProbe {
            dependency: COMPOSER.name,
            reason: format!("no version in {:?}", banner.trim()),
        })?;
        match COMPOSER.min_version {
            Some(required) if found < required => Ok(Assessment::Outdated { found, required }),
            _ => Ok(Assessment::Satisfied {
                version: Some(found),
            }),
        }
    }

    fn install(
        &self,
        ctx: &ReconcileContext<'_>,
        assessment: &Assessment,
        reporter: &mut Reporter<'_>,
    ) -> Result<()> {
        match (assessment, locate_composer(ctx)) {
            (Assessment::Outdated { .. }, Some(path)) => self_update(ctx, &path, reporter),
            _ => bootstrap(ctx, reporter),
        }
    }
}

fn bootstrap(ctx: &ReconcileContext<'_>, reporter: &mut Reporter<'_>) -> Result<()> {
    let candidates = placements(ctx.dirs, ctx.privilege);
    let Some(first) = candidates.first() else {
        return Err(InstallerError::DependencyInstall {
            tool: COMPOSER.name,
            message: "no directory available for the composer executable".to_owned(),
        });
    };
    if !ctx.gate.confirm(&format!(
        "Download and install Composer into {}?",
        first.dir().display()
    )) {
        return Err(InstallerError::MissingDependencyDeclined {
            dependency: COMPOSER.name,
            remediation: COMPOSER.manual_hint.to_owned(),
        });
    }

    reporter.step("Downloading the Composer installer...");
    let staging = tempfile::tempdir()?;
    let signature = ctx.downloader.fetch_text(COMPOSER_SIGNATURE_URL)?;
    let expected = Sha384Digest::try_from(signature.as_str()).map_err(|err| {
        InstallerError::IntegrityVerification {
            artefact: INSTALLER_ARTEFACT,
            reason: err.to_string(),
        }
    })?;
    let payload = staging.path().join("composer-setup.php");
    ctx.downloader.fetch_to_file(COMPOSER_INSTALLER_URL, &payload)?;
    verify_payload(INSTALLER_ARTEFACT, &payload, &expected)?;

    let mut last_failure = String::new();
    for placement in &candidates {
        match run_installer(ctx, &payload, placement) {
            Ok(()) => {
                reporter.step(format!(
                    "Composer installed to {}",
                    placement.dir().join(COMPOSER.binary).display()
                ));
                return Ok(());
            }
            Err(err) => {
                warn!("composer install into {} failed: {err}", placement.dir().display());
                last_failure = err.to_string();
            }
        }
    }
    Err(InstallerError::DependencyInstall {
        tool: COMPOSER.name,
        message: last_failure,
    })
}

fn run_installer(ctx: &ReconcileContext<'_>, payload: &Path, placement: &Placement) -> Result<()> {
    let dir = placement.dir().to_string_lossy().into_owned();
    let args = vec![
        payload.to_string_lossy().into_owned(),
        format!("--install-dir={dir}"),
        format!("--filename={}", COMPOSER.binary),
    ];
    match placement {
        Placement::Direct(path) => {
            std::fs::create_dir_all(path)?;
            run_checked(ctx.executor, PHP.binary, &args)
        }
        Placement::Elevated(_) => {
            let (program, mkdir_args) = ctx
                .privilege
                .elevate("mkdir", &["-p".to_owned(), dir])?;
            run_checked(ctx.executor, &program, &mkdir_args)?;
            let (program, php_args) = ctx.privilege.elevate(PHP.binary, &args)?;
            run_checked(ctx.executor, &program, &php_args)
        }
    }
}

fn self_update(ctx: &ReconcileContext<'_>, path: &Path, reporter: &mut Reporter<'_>) -> Result<()> {
    let program = path.to_string_lossy().into_owned();
    let args = vec!["self-update".to_owned()];
    let elevate = path.parent().is_some_and(|dir| !is_writable(dir));
    let rendered = ctx.privilege.render(elevate, &program, &args);
    if !ctx.gate.confirm(&format!("Update Composer with `{rendered}`?")) {
        return Err(InstallerError::MissingDependencyDeclined {
            dependency: COMPOSER.name,
            remediation: rendered,
        });
    }
    reporter.step("Updating Composer...");
    let (program, args) = if elevate {
        ctx.privilege.elevate(&program, &args)?
    } else {
        (program, args)
    };
    run_checked(ctx.executor, &program, &args)
}

fn run_checked(executor: &dyn CommandExecutor, program: &str, args: &[String]) -> Result<()> {
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    debug!("composer step: {program} {}", arg_refs.join(" "));
    let output = executor.run(program, &arg_refs)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(InstallerError::DependencyInstall {
            tool: COMPOSER.name,
            message: failure_message(&output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::ConfirmationGate;
    use crate::download::{DownloadError, Downloader, MockDownloader};
    use crate::package_manager::PackageManagerKind;
    use crate::platform::{OsKind, PlatformProfile};
    use crate::privilege::Privilege;
    use crate::test_utils::{
        ANY_ARG, ExpectedCall, ScriptedPrompter, StubDirs, StubDownloader, StubExecutor,
    };
    use tempfile::TempDir;

    fn with_ctx<R>(
        executor: &StubExecutor,
        downloader: &dyn Downloader,
        dirs: &StubDirs,
        privilege: Privilege,
        f: impl FnOnce(&ReconcileContext<'_>) -> R,
    ) -> R {
        let profile = PlatformProfile::new(OsKind::Linux, "x86_64", PackageManagerKind::None);
        let prompter = ScriptedPrompter::piped();
        let gate = ConfirmationGate::new(true, &prompter);
        let ctx = ReconcileContext {
            profile: &profile,
            manager: None,
            privilege,
            gate: &gate,
            executor,
            downloader,
            dirs,
        };
        f(&ctx)
    }

    fn assess_with(executor: &StubExecutor, dirs: &StubDirs) -> Result<Assessment> {
        with_ctx(executor, &StubDownloader::new(), dirs, Privilege::Root, |ctx| {
            ComposerReconciler.assess(ctx)
        })
    }

    fn install_with(
        executor: &StubExecutor,
        downloader: &dyn Downloader,
        dirs: &StubDirs,
        privilege: Privilege,
        assessment: &Assessment,
    ) -> Result<()> {
        with_ctx(executor, downloader, dirs, privilege, |ctx| {
            let mut out = Vec::new();
            let mut reporter = Reporter::new(&mut out, true);
            ComposerReconciler.install(ctx, assessment, &mut reporter)
        })
    }

    fn signed_installer(payload: &[u8]) -> StubDownloader {
        let scratch = TempDir::new().expect("temp dir");
        let path = scratch.path().join("payload");
        std::fs::write(&path, payload).expect("payload");
        let digest = crate::integrity::digest_file(&path).expect("digest");
        StubDownloader::new()
            .with_body(COMPOSER_SIGNATURE_URL, digest.as_str())
            .with_body(COMPOSER_INSTALLER_URL, payload)
    }

    #[test]
    fn missing_everywhere_is_missing() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        let executor = StubExecutor::new(vec![]);

        assert_eq!(assess_with(&executor, &dirs).expect("assessment"), Assessment::Missing);
    }

    #[test]
    fn finds_user_local_install_off_path() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        let composer = dirs.user_bin().join("composer");
        std::fs::create_dir_all(dirs.user_bin()).expect("user bin");
        std::fs::write(&composer, "").expect("composer stub");
        let executor = StubExecutor::new(vec![
            ExpectedCall::new(composer.to_str().expect("utf-8"), &["--version", "--no-ansi"])
                .stdout("Composer version 2.8.4 2024-12-11 11:57:47\n"),
        ]);

        let assessment = assess_with(&executor, &dirs).expect("assessment");

        assert_eq!(
            assessment,
            Assessment::Satisfied {
                version: Some(Version::new(2, 8))
            }
        );
        executor.assert_finished();
    }

    #[test]
    fn old_composer_is_outdated() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("/usr/bin/composer", &[ANY_ARG, ANY_ARG])
                .stdout("Composer version 2.1.14 2021-11-30 10:51:43\n"),
        ])
        .with_binary("composer", "/usr/bin/composer");

        assert_eq!(
            assess_with(&executor, &dirs).expect("assessment"),
            Assessment::Outdated {
                found: Version::new(2, 1),
                required: Version::new(2, 2),
            }
        );
    }

    #[test]
    fn signature_failure_stops_before_the_installer_download() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        let mut downloader = MockDownloader::new();
        downloader
            .expect_fetch_text()
            .withf(|url| url == COMPOSER_SIGNATURE_URL)
            .times(1)
            .returning(|url| {
                Err(DownloadError::NotFound {
                    url: url.to_owned(),
                })
            });
        downloader.expect_fetch_to_file().never();
        let executor = StubExecutor::new(vec![]);

        let err = install_with(&executor, &downloader, &dirs, Privilege::Root, &Assessment::Missing)
            .expect_err("signature unavailable");

        assert!(matches!(err, InstallerError::Download(DownloadError::NotFound { .. })));
        assert!(executor.invocations().is_empty());
    }

    #[test]
    fn unwritable_system_dir_without_sudo_installs_for_the_user() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path()).without_system_bin_on_disk();
        let install_dir = format!("--install-dir={}", dirs.user_bin().display());
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("php", &[ANY_ARG, &install_dir, "--filename=composer"])
                .creates_file(dirs.user_bin().join("composer")),
        ]);
        let downloader = signed_installer(b"<?php // setup\n");

        install_with(
            &executor,
            &downloader,
            &dirs,
            Privilege::Unavailable,
            &Assessment::Missing,
        )
        .expect("user-local install");

        executor.assert_finished();
        assert!(dirs.user_bin().join("composer").is_file());
    }

    #[test]
    fn outdated_composer_self_updates_in_place() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        let composer = dirs.system_bin().join("composer");
        std::fs::write(&composer, "").expect("composer stub");
        let program = composer.to_str().expect("utf-8");
        let executor = StubExecutor::new(vec![ExpectedCall::new(program, &["self-update"])]);
        let outdated = Assessment::Outdated {
            found: Version::new(2, 1),
            required: Version::new(2, 2),
        };

        install_with(&executor, &StubDownloader::new(), &dirs, Privilege::Sudo, &outdated)
            .expect("self-update");

        executor.assert_finished();
    }
}
