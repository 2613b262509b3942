//! git reconciler.

use super::{Assessment, ReconcileContext, Reconciler, install_with_manager};
use crate::error::Result;
use crate::output::Reporter;
use crate::requirement::{GIT, RequirementSpec};
use crate::version::Version;
use log::debug;

/// Ensures `git` is on the search path.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitReconciler;

impl Reconciler for GitReconciler {
    fn spec(&self) -> &'static RequirementSpec {
        &GIT
    }

    fn assess(&self, ctx: &ReconcileContext<'_>) -> Result<Assessment> {
        match ctx.executor.run(GIT.binary, &["--version"]) {
            Ok(output) if output.status.success() => {
                let banner = String::from_utf8_lossy(&output.stdout);
                Ok(Assessment::Satisfied {
                    version: Version::find_in(&banner),
                })
            }
            Ok(_) => Ok(Assessment::Missing),
            Err(err) => {
                debug!("git probe could not start: {err}");
                Ok(Assessment::Missing)
            }
        }
    }

    fn install(
        &self,
        ctx: &ReconcileContext<'_>,
        _assessment: &Assessment,
        reporter: &mut Reporter<'_>,
    ) -> Result<()> {
        install_with_manager(ctx, &GIT, reporter)
    }
}
