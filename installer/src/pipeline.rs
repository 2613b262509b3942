//! Install pipeline orchestration.
//!
//! A full run walks every stage in order: PHP, Composer, git, the Coqui
//! checkout, its Composer dependencies, the default configuration and the
//! launcher. A selective run executes only the requested stages and checks
//! that whatever a stage builds on is already present.

use crate::bin_dir::path_instructions;
use crate::config_file::{ConfigOutcome, DEFAULT_CONFIG, ensure_config};
use crate::error::{InstallerError, Result};
use crate::launcher::{LauncherResult, publish_launcher};
use crate::output::Reporter;
use crate::reconcile::{
    ComposerReconciler, EnsureOutcome, GitReconciler, PhpProbe, PhpReconciler, ReconcileContext,
    ensure, locate_composer,
};
use crate::repository::{SyncOutcome, install_dependencies, synchronize};
use crate::requirement::{COMPOSER, PHP};
use crate::run_config::{InstallMode, RunConfig, Selection};
use camino::Utf8PathBuf;
use log::info;

/// What a run did, stage by stage; `None` marks a stage that did not run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// PHP reconciliation.
    pub php: Option<EnsureOutcome>,
    /// Composer reconciliation.
    pub composer: Option<EnsureOutcome>,
    /// git reconciliation.
    pub git: Option<EnsureOutcome>,
    /// Checkout synchronisation.
    pub sync: Option<SyncOutcome>,
    /// Default configuration.
    pub config: Option<ConfigOutcome>,
    /// Published launcher.
    pub launcher: Option<LauncherResult>,
    /// Install root of the Coqui checkout, when it was touched.
    pub install_root: Option<Utf8PathBuf>,
}

impl RunSummary {
    /// Writes the closing summary lines.
    pub fn report(&self, reporter: &mut Reporter<'_>) {
        let Some(root) = &self.install_root else {
            reporter.step("Requested components are installed");
            return;
        };
        reporter.step(format!("Coqui is installed in {root}"));
        match self.config {
            Some(ConfigOutcome::Created) => reporter.step(format!(
                "Default configuration written to {}",
                root.join(crate::run_config::CONFIG_FILE_NAME)
            )),
            Some(ConfigOutcome::Preserved) => reporter.step("Existing configuration kept"),
            None => {}
        }
        if let Some(launcher) = &self.launcher {
            reporter.step(format!("Run `coqui` ({}) to get started", launcher.path.display()));
        }
    }
}

/// Runs the stages selected by `config.mode`.
///
/// # Errors
///
/// Returns the first stage failure; later stages do not run.
/// [`InstallerError::PrerequisiteMissing`] is returned by a selective run
/// whose stage depends on something absent and not requested.
pub fn run_install(
    config: &RunConfig,
    ctx: &ReconcileContext<'_>,
    reporter: &mut Reporter<'_>,
) -> Result<RunSummary> {
    let (selection, selective) = match config.mode {
        InstallMode::Full => (
            Selection {
                php: true,
                composer: true,
                coqui: true,
            },
            false,
        ),
        InstallMode::Selective(selection) => (selection, true),
    };
    info!("installing on {}", ctx.profile);
    let mut summary = RunSummary::default();

    if selection.php {
        summary.php = Some(ensure(&PhpReconciler, ctx, reporter)?);
    }
    if selection.composer {
        if selective && !selection.php {
            require_php(ctx, "--install-php")?;
        }
        summary.composer = Some(ensure(&ComposerReconciler, ctx, reporter)?);
    }
    if selection.coqui {
        if selective {
            if !selection.php {
                require_php(ctx, "--install-php")?;
            }
            if !selection.composer {
                require_composer(ctx)?;
            }
        }
        summary.git = Some(ensure(&GitReconciler, ctx, reporter)?);
        install_coqui(config, ctx, reporter, &mut summary)?;
    }
    Ok(summary)
}

fn install_coqui(
    config: &RunConfig,
    ctx: &ReconcileContext<'_>,
    reporter: &mut Reporter<'_>,
    summary: &mut RunSummary,
) -> Result<()> {
    let root = &config.install_root;
    summary.install_root = Some(root.clone());
    summary.sync = Some(synchronize(config, ctx.executor, ctx.gate, reporter)?);

    let composer = locate_composer(ctx).map_or_else(
        || COMPOSER.binary.to_owned(),
        |path| path.to_string_lossy().into_owned(),
    );
    reporter.step("Installing Coqui dependencies with Composer...");
    install_dependencies(ctx.executor, &composer, root)?;

    let config_outcome = ensure_config(&config.config_path(), DEFAULT_CONFIG)?;
    summary.config = Some(config_outcome);

    let launcher = publish_launcher(ctx, &config.entry_point())?;
    if !launcher.in_path {
        reporter.warn(format!("{} is not on your PATH", launcher.dir().display()));
        reporter.advise(path_instructions(launcher.dir()));
    }
    summary.launcher = Some(launcher);
    Ok(())
}

fn require_php(ctx: &ReconcileContext<'_>, flag: &'static str) -> Result<()> {
    if PhpProbe::run(ctx.executor)?.is_some() {
        Ok(())
    } else {
        Err(InstallerError::PrerequisiteMissing {
            dependency: PHP.name,
            flag,
        })
    }
}

fn require_composer(ctx: &ReconcileContext<'_>) -> Result<()> {
    if locate_composer(ctx).is_some() {
        Ok(())
    } else {
        Err(InstallerError::PrerequisiteMissing {
            dependency: COMPOSER.name,
            flag: "--install-composer",
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
