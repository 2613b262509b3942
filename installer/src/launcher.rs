//! Launcher publication.
//!
//! Puts a `coqui` command on the search path that runs the checkout's
//! `bin/coqui`: a symlink on Unix, a `.cmd` wrapper on Windows. The system
//! bin directory is preferred, escalating once through `sudo` when it is not
//! writable, and the user-local bin directory is the fallback.

use crate::bin_dir::{Placement, is_directory_in_path, placements};
use crate::error::{InstallerError, Result};
use crate::exec::failure_message;
use crate::reconcile::ReconcileContext;
use camino::Utf8Path;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Command name the launcher is published under.
pub const LAUNCHER_NAME: &str = "coqui";

/// Result of launcher publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherResult {
    /// Path of the published launcher.
    pub path: PathBuf,
    /// Whether the launcher's directory is on `PATH`.
    pub in_path: bool,
    /// Whether publication went through `sudo`.
    pub elevated: bool,
}

impl LauncherResult {
    /// Directory holding the launcher.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// Publishes the launcher for `entry_point`.
///
/// # Errors
///
/// Returns [`InstallerError::LauncherPublish`] when every candidate
/// directory fails.
pub fn publish_launcher(ctx: &ReconcileContext<'_>, entry_point: &Utf8Path) -> Result<LauncherResult> {
    let mut failures = Vec::new();
    for placement in placements(ctx.dirs, ctx.privilege) {
        match publish_into(ctx, &placement, entry_point) {
            Ok(path) => {
                let path_var = std::env::var_os("PATH");
                return Ok(LauncherResult {
                    in_path: is_directory_in_path(placement.dir(), path_var.as_deref()),
                    path,
                    elevated: placement.is_elevated(),
                });
            }
            Err(err) => {
                warn!("could not publish launcher in {}: {err}", placement.dir().display());
                failures.push(format!("{}: {err}", placement.dir().display()));
            }
        }
    }
    if failures.is_empty() {
        failures.push("no candidate directory".to_owned());
    }
    Err(InstallerError::LauncherPublish(failures.join("; ")))
}

fn launcher_file_name() -> String {
    if cfg!(windows) {
        format!("{LAUNCHER_NAME}.cmd")
    } else {
        LAUNCHER_NAME.to_owned()
    }
}

fn publish_into(
    ctx: &ReconcileContext<'_>,
    placement: &Placement,
    entry_point: &Utf8Path,
) -> Result<PathBuf> {
    let dir = placement.dir();
    let link = dir.join(launcher_file_name());
    match placement {
        Placement::Direct(_) => {
            std::fs::create_dir_all(dir)?;
            write_launcher(entry_point, &link)?;
        }
        Placement::Elevated(_) => {
            if existing_launcher(entry_point, &link)? == Existing::Current {
                debug!("launcher at {} is current", link.display());
                return Ok(link);
            }
            let dir_arg = dir.to_string_lossy().into_owned();
            let link_arg = link.to_string_lossy().into_owned();
            run_elevated(ctx, "mkdir", &["-p".to_owned(), dir_arg])?;
            run_elevated(
                ctx,
                "ln",
                &["-sfn".to_owned(), entry_point.to_string(), link_arg],
            )?;
        }
    }
    debug!("launcher published at {}", link.display());
    Ok(link)
}

fn run_elevated(ctx: &ReconcileContext<'_>, program: &str, args: &[String]) -> Result<()> {
    let (program, args) = ctx.privilege.elevate(program, args)?;
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = ctx.executor.run(&program, &arg_refs)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(InstallerError::LauncherPublish(failure_message(&output)))
    }
}

/// What already occupies the launcher path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existing {
    Missing,
    Current,
    StaleLink,
}

/// Inspects `link` without following it. Reading link metadata needs no
/// write access, so the elevated path runs the same check before `sudo`.
fn existing_launcher(entry_point: &Utf8Path, link: &Path) -> Result<Existing> {
    match std::fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            if std::fs::read_link(link)? == entry_point.as_std_path() {
                Ok(Existing::Current)
            } else {
                Ok(Existing::StaleLink)
            }
        }
        Ok(_) => Err(InstallerError::LauncherPublish(format!(
            "{} exists and is not a symlink",
            link.display()
        ))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Existing::Missing),
        Err(err) => Err(err.into()),
    }
}

#[cfg(unix)]
fn write_launcher(entry_point: &Utf8Path, link: &Path) -> Result<()> {
    match existing_launcher(entry_point, link)? {
        Existing::Current => return Ok(()),
        Existing::StaleLink => std::fs::remove_file(link)?,
        Existing::Missing => {}
    }
    std::os::unix::fs::symlink(entry_point, link)?;
    Ok(())
}

#[cfg(windows)]
fn write_launcher(entry_point: &Utf8Path, link: &Path) -> Result<()> {
    std::fs::write(link, windows_wrapper_content(entry_point))?;
    Ok(())
}

/// Body of the Windows `.cmd` wrapper.
#[must_use]
pub fn windows_wrapper_content(entry_point: &Utf8Path) -> String {
    format!("@echo off\r\nphp \"{entry_point}\" %*\r\n")
}
