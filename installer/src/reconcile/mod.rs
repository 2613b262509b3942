//! Dependency reconciliation.
//!
//! Each managed dependency implements [`Reconciler`]: probe what is on the
//! host, compare it with its [`RequirementSpec`], and install through the
//! injected [`PackageManager`] when the host falls short. [`ensure`] is the
//! shared state machine; a satisfied dependency costs exactly one probe and
//! zero install invocations, which keeps repeated runs idempotent.

mod composer;
mod git;
mod php;

pub use composer::{ComposerReconciler, locate_composer};
pub use git::GitReconciler;
pub use php::{PhpReconciler, PhpProbe};

use crate::confirm::ConfirmationGate;
use crate::dirs::BaseDirs;
use crate::download::Downloader;
use crate::error::{InstallerError, Result};
use crate::exec::CommandExecutor;
use crate::output::Reporter;
use crate::package_manager::PackageManager;
use crate::platform::PlatformProfile;
use crate::privilege::Privilege;
use crate::requirement::RequirementSpec;
use crate::version::Version;

/// What the probe found, relative to the requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    /// The dependency is not installed.
    Missing,
    /// Installed, but older than the minimum.
    Outdated {
        /// Detected version.
        found: Version,
        /// Minimum accepted version.
        required: Version,
    },
    /// Installed at an acceptable version, without some capabilities.
    MissingCapabilities {
        /// Detected version.
        found: Version,
        /// Capabilities that are not loaded.
        missing: Vec<String>,
    },
    /// Nothing to do.
    Satisfied {
        /// Detected version, when the tool reports one.
        version: Option<Version>,
    },
}

/// Result of the optional post-install check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The install command's exit status is taken at face value.
    Trusted,
    /// A re-probe found everything in place.
    Satisfied,
    /// A re-probe still finds these capabilities missing.
    Unresolved(Vec<String>),
}

/// Outcome of [`ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The host already met the requirement.
    AlreadySatisfied,
    /// The dependency was installed or upgraded.
    Installed,
    /// Installed, and the operator chose to continue without these
    /// capabilities.
    InstalledWithGaps(Vec<String>),
}

/// Everything a reconciler may touch, fixed for the whole run.
pub struct ReconcileContext<'a> {
    /// Detected host.
    pub profile: &'a PlatformProfile,
    /// The detected package manager, if any.
    pub manager: Option<&'a dyn PackageManager>,
    /// How to run root-only commands.
    pub privilege: Privilege,
    /// The confirmation policy.
    pub gate: &'a ConfirmationGate<'a>,
    /// Command runner.
    pub executor: &'a dyn CommandExecutor,
    /// HTTP client.
    pub downloader: &'a dyn Downloader,
    /// Host directories.
    pub dirs: &'a dyn BaseDirs,
}

/// A check-or-install step for one dependency.
pub trait Reconciler {
    /// The requirement this reconciler enforces.
    fn spec(&self) -> &'static RequirementSpec;

    /// Probes the host.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::DependencyProbe`] when the dependency is
    /// present but its introspection output cannot be understood.
    fn assess(&self, ctx: &ReconcileContext<'_>) -> Result<Assessment>;

    /// Brings the host up to the requirement.
    ///
    /// # Errors
    ///
    /// Returns the install failure, or the decline when the operator refuses.
    fn install(
        &self,
        ctx: &ReconcileContext<'_>,
        assessment: &Assessment,
        reporter: &mut Reporter<'_>,
    ) -> Result<()>;

    /// Re-checks the host after [`Reconciler::install`].
    ///
    /// # Errors
    ///
    /// Returns probe failures.
    fn verify(&self, _ctx: &ReconcileContext<'_>) -> Result<Verification> {
        Ok(Verification::Trusted)
    }
}

/// Runs probe, install and verification for one dependency.
///
/// # Errors
///
/// Propagates every failure from the reconciler; a decline of the
/// "continue without" prompt yields [`InstallerError::MissingDependencyDeclined`].
pub fn ensure(
    reconciler: &dyn Reconciler,
    ctx: &ReconcileContext<'_>,
    reporter: &mut Reporter<'_>,
) -> Result<EnsureOutcome> {
    let spec = reconciler.spec();
    let assessment = reconciler.assess(ctx)?;
    match &assessment {
        Assessment::Satisfied { version } => {
            match version {
                Some(version) => reporter.step(format!("{} {version} found", spec.name)),
                None => reporter.step(format!("{} found", spec.name)),
            }
            return Ok(EnsureOutcome::AlreadySatisfied);
        }
        Assessment::Missing => reporter.warn(format!("{} is not installed", spec.name)),
        Assessment::Outdated { found, required } => reporter.warn(format!(
            "{} {found} found, {required} or newer is required",
            spec.name
        )),
        Assessment::MissingCapabilities { found, missing } => reporter.warn(format!(
            "{} {found} is missing extensions: {}",
            spec.name,
            missing.join(", ")
        )),
    }

    reconciler.install(ctx, &assessment, reporter)?;

    match reconciler.verify(ctx)? {
        Verification::Trusted | Verification::Satisfied => {
            reporter.step(format!("{} installed", spec.name));
            Ok(EnsureOutcome::Installed)
        }
        Verification::Unresolved(missing) => {
            let list = missing.join(", ");
            reporter.warn(format!(
                "{} is still missing extensions after install: {list}",
                spec.name
            ));
            if ctx
                .gate
                .confirm(&format!("Continue without the {list} extensions?"))
            {
                Ok(EnsureOutcome::InstalledWithGaps(missing))
            } else {
                Err(InstallerError::MissingDependencyDeclined {
                    dependency: spec.name,
                    remediation: spec.manual_hint.to_owned(),
                })
            }
        }
    }
}

/// Installs `spec` with the detected package manager after confirmation.
///
/// # Errors
///
/// Returns [`InstallerError::PackageManagerUnavailable`] when there is no
/// manager or it has no packages for `spec`,
/// [`InstallerError::MissingDependencyDeclined`] when the operator declines,
/// and the package manager's own failure otherwise.
pub fn install_with_manager(
    ctx: &ReconcileContext<'_>,
    spec: &'static RequirementSpec,
    reporter: &mut Reporter<'_>,
) -> Result<()> {
    let unavailable = || InstallerError::PackageManagerUnavailable {
        dependency: spec.name,
        guidance: format!("{} (detected {})", spec.manual_hint, ctx.profile),
    };
    let manager = ctx.manager.ok_or_else(unavailable)?;
    let packages = spec.packages_for(manager.kind()).ok_or_else(unavailable)?;

    let (program, args) = manager.install_command(&packages);
    let rendered = ctx.privilege.render(manager.requires_root(), program, &args);
    if !ctx.gate.confirm(&format!("Install {} with `{rendered}`?", spec.name)) {
        return Err(InstallerError::MissingDependencyDeclined {
            dependency: spec.name,
            remediation: rendered,
        });
    }

    reporter.step(format!("Installing {} with {}...", spec.name, manager.kind()));
    manager.install_packages(ctx.executor, ctx.privilege, spec.name, &packages)
}

#[cfg(test)]
mod tests;
