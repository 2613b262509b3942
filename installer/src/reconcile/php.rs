//! PHP runtime and extension reconciler.

use super::{Assessment, ReconcileContext, Reconciler, Verification, install_with_manager};
use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, failure_message};
use crate::output::Reporter;
use crate::requirement::{PHP, RequirementSpec};
use crate::version::Version;
use log::debug;
use serde::Deserialize;

/// Prints the runtime version and loaded extensions as one JSON object.
const PROBE_SCRIPT: &str = "echo json_encode(['version' => PHP_VERSION, \
    'extensions' => array_map('strtolower', get_loaded_extensions())]);";

/// What the PHP probe reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhpProbe {
    /// `PHP_VERSION`, e.g. `8.4.1`.
    pub version: String,
    /// Lower-cased names of the loaded extensions.
    pub extensions: Vec<String>,
}

impl PhpProbe {
    /// Runs the probe; `Ok(None)` means `php` could not be started.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::DependencyProbe`] when `php` runs but fails
    /// or prints something other than the expected JSON.
    pub fn run(executor: &dyn CommandExecutor) -> Result<Option<Self>> {
        let output = match executor.run(PHP.binary, &["-r", PROBE_SCRIPT]) {
            Ok(output) => output,
            Err(err) => {
                debug!("php probe could not start: {err}");
                return Ok(None);
            }
        };
        if !output.status.success() {
            return Err(InstallerError::DependencyProbe {
                dependency: PHP.name,
                reason: failure_message(&output),
            });
        }
        Self::parse(&String::from_utf8_lossy(&output.stdout)).map(Some)
    }

    /// Parses probe output.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::DependencyProbe`] for malformed JSON.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text.trim()).map_err(|err| InstallerError::DependencyProbe {
            dependency: PHP.name,
            reason: format!("unexpected probe output: {err}"),
        })
    }

    /// Required extensions that are not loaded.
    #[must_use]
    pub fn missing_extensions(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.extensions.iter().any(|ext| ext.eq_ignore_ascii_case(name)))
            .map(|name| (*name).to_owned())
            .collect()
    }

    fn parsed_version(&self) -> Result<Version> {
        self.version
            .parse()
            .map_err(|err| InstallerError::DependencyProbe {
                dependency: PHP.name,
                reason: format!("{err}"),
            })
    }
}

/// Ensures PHP at the minimum version with every required extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpReconciler;

impl Reconciler for PhpReconciler {
    fn spec(&self) -> &'static RequirementSpec {
        &PHP
    }

    fn assess(&self, ctx: &ReconcileContext<'_>) -> Result<Assessment> {
        let Some(probe) = PhpProbe::run(ctx.executor)? else {
            return Ok(Assessment::Missing);
        };
        let found = probe.parsed_version()?;
        if let Some(required) = PHP.min_version
            && found < required
        {
            return Ok(Assessment::Outdated { found, required });
        }
        let missing = probe.missing_extensions(PHP.capabilities);
        if missing.is_empty() {
            Ok(Assessment::Satisfied {
                version: Some(found),
            })
        } else {
            Ok(Assessment::MissingCapabilities { found, missing })
        }
    }

    fn install(
        &self,
        ctx: &ReconcileContext<'_>,
        _assessment: &Assessment,
        reporter: &mut Reporter<'_>,
    ) -> Result<()> {
        install_with_manager(ctx, &PHP, reporter)
    }

    /// Only managers that bundle extensions into the runtime package are
    /// re-probed; elsewhere each extension has its own package.
    fn verify(&self, ctx: &ReconcileContext<'_>) -> Result<Verification> {
        if !ctx.manager.is_some_and(|manager| manager.bundles_extensions()) {
            return Ok(Verification::Trusted);
        }
        let probe = PhpProbe::run(ctx.executor)?.ok_or_else(|| {
            InstallerError::DependencyInstall {
                tool: PHP.name,
                message: "php is still not on the search path".to_owned(),
            }
        })?;
        let missing = probe.missing_extensions(PHP.capabilities);
        if missing.is_empty() {
            Ok(Verification::Satisfied)
        } else {
            Ok(Verification::Unresolved(missing))
        }
    }
}
