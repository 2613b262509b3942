//! Cloning and fast-forwarding the Coqui checkout.
//!
//! The install root is treated as installed only when it contains a `.git`
//! directory. An existing checkout is updated by fetching the tracked ref and
//! comparing revisions; the Composer dependency install runs on every path,
//! including an already-current checkout.

use crate::confirm::ConfirmationGate;
use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, failure_message};
use crate::output::Reporter;
use crate::run_config::RunConfig;
use camino::Utf8Path;
use log::debug;

/// Marker whose presence identifies an existing install.
pub const GIT_MARKER: &str = ".git";

/// State of the install root relative to the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    /// No checkout yet.
    Absent,
    /// Checkout matches the fetched revision.
    PresentCurrent,
    /// The fetched revision differs from `HEAD`.
    PresentStale,
}

/// What [`synchronize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A fresh clone was made.
    Cloned,
    /// Nothing to pull.
    AlreadyCurrent,
    /// The checkout was fast-forwarded.
    Updated,
    /// An update was available and the operator declined it.
    UpdateDeclined,
}

/// Returns true if `root` holds a git checkout.
#[must_use]
pub fn is_checkout(root: &Utf8Path) -> bool {
    root.join(GIT_MARKER).exists()
}

/// Clones or updates the checkout at `config.install_root`.
///
/// # Errors
///
/// Returns [`InstallerError::Git`] for any failed git operation, including a
/// non-empty install root that is not a checkout.
pub fn synchronize(
    config: &RunConfig,
    executor: &dyn CommandExecutor,
    gate: &ConfirmationGate<'_>,
    reporter: &mut Reporter<'_>,
) -> Result<SyncOutcome> {
    let root = config.install_root.as_path();
    let reference = if is_checkout(root) {
        Some(tracking_ref(config, executor)?)
    } else {
        None
    };
    let state = match reference.as_deref() {
        None => RepoState::Absent,
        Some(reference) => {
            reporter.step(format!("Checking {root} for updates on {reference}..."));
            fetch_state(root, reference, executor)?
        }
    };

    match (state, reference) {
        (RepoState::PresentCurrent, Some(_)) => {
            reporter.step("Coqui is up to date");
            Ok(SyncOutcome::AlreadyCurrent)
        }
        (RepoState::PresentStale, Some(reference)) => {
            if !gate.confirm("A Coqui update is available. Update now?") {
                reporter.step("Update skipped");
                return Ok(SyncOutcome::UpdateDeclined);
            }
            reporter.step("Updating Coqui...");
            git(executor, root, "pull", &["pull", "--ff-only", "origin", &reference])?;
            Ok(SyncOutcome::Updated)
        }
        _ => {
            ensure_clone_target(root)?;
            reporter.step(format!("Cloning {} into {root}...", config.repo_url));
            clone(config, executor)?;
            Ok(SyncOutcome::Cloned)
        }
    }
}

/// Runs `composer install` for the checkout.
///
/// # Errors
///
/// Returns [`InstallerError::DependencyInstall`] if Composer fails.
pub fn install_dependencies(
    executor: &dyn CommandExecutor,
    composer: &str,
    root: &Utf8Path,
) -> Result<()> {
    let output = executor.run(
        composer,
        &[
            "install",
            "--no-interaction",
            "--no-dev",
            "--optimize-autoloader",
            "--working-dir",
            root.as_str(),
        ],
    )?;
    if output.status.success() {
        Ok(())
    } else {
        Err(InstallerError::DependencyInstall {
            tool: "Coqui dependencies",
            message: failure_message(&output),
        })
    }
}

/// Git refuses to clone into a non-empty directory. Anything already there
/// belongs to the operator, so the clone fails before git runs and nothing
/// is removed.
fn ensure_clone_target(root: &Utf8Path) -> Result<()> {
    let occupied = root.is_dir() && std::fs::read_dir(root)?.next().is_some();
    if occupied {
        debug!("{root} is not empty and has no {GIT_MARKER}");
        return Err(InstallerError::Git {
            operation: "clone",
            message: format!("{root} exists, is not empty and is not a Coqui checkout"),
            root: root.to_owned(),
        });
    }
    Ok(())
}

fn clone(config: &RunConfig, executor: &dyn CommandExecutor) -> Result<()> {
    let root = config.install_root.as_path();
    if let Some(parent) = root.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut args = vec!["clone", "--depth", "1"];
    if let Some(pin) = config.version_pin.as_deref() {
        args.extend(["--branch", pin]);
    }
    args.extend([config.repo_url.as_str(), root.as_str()]);
    run_git(executor, root, "clone", &args)?;
    Ok(())
}

/// The ref to follow: the pin, or the branch currently checked out.
fn tracking_ref(config: &RunConfig, executor: &dyn CommandExecutor) -> Result<String> {
    if let Some(pin) = &config.version_pin {
        return Ok(pin.clone());
    }
    let root = config.install_root.as_path();
    let branch = git(executor, root, "rev-parse", &["rev-parse", "--abbrev-ref", "HEAD"])?;
    if branch == "HEAD" {
        return Err(InstallerError::Git {
            operation: "fetch",
            message: "checkout is on a detached HEAD; set COQUI_VERSION to the branch or tag to follow"
                .to_owned(),
            root: root.to_owned(),
        });
    }
    Ok(branch)
}

fn fetch_state(
    root: &Utf8Path,
    reference: &str,
    executor: &dyn CommandExecutor,
) -> Result<RepoState> {
    git(executor, root, "fetch", &["fetch", "origin", reference])?;
    let head = git(executor, root, "rev-parse", &["rev-parse", "HEAD"])?;
    let fetched = git(executor, root, "rev-parse", &["rev-parse", "FETCH_HEAD^{commit}"])?;
    debug!("HEAD {head}, FETCH_HEAD {fetched}");
    if head == fetched {
        Ok(RepoState::PresentCurrent)
    } else {
        Ok(RepoState::PresentStale)
    }
}

/// Runs `git -C <root> <args>` and returns trimmed stdout.
fn git(
    executor: &dyn CommandExecutor,
    root: &Utf8Path,
    operation: &'static str,
    args: &[&str],
) -> Result<String> {
    let mut full = vec!["-C", root.as_str()];
    full.extend_from_slice(args);
    run_git(executor, root, operation, &full)
}

fn run_git(
    executor: &dyn CommandExecutor,
    root: &Utf8Path,
    operation: &'static str,
    args: &[&str],
) -> Result<String> {
    let output = executor.run("git", args)?;
    if !output.status.success() {
        return Err(InstallerError::Git {
            operation,
            message: failure_message(&output),
            root: root.to_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}
