//! External command execution.
//!
//! Every package-manager, git, PHP, and Composer invocation goes through the
//! [`CommandExecutor`] trait so reconcilers can be exercised without touching
//! the host system.

use crate::error::{InstallerError, Result};
use log::debug;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Abstraction for running external commands and resolving binaries.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use coqui_installer::exec::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("git", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), coqui_installer::error::InstallerError>(())
    /// ```
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output>;

    /// Resolves a binary name against the executable search path.
    fn which(&self, binary: &str) -> Option<PathBuf>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        debug!("running {cmd} {}", args.join(" "));
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(InstallerError::from)
    }

    fn which(&self, binary: &str) -> Option<PathBuf> {
        which::which(binary).ok()
    }
}

/// Returns the trimmed stdout of a successful command, or `None` when the
/// command could not be spawned or exited non-zero.
pub fn stdout_of(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> Option<String> {
    let output = executor.run(cmd, args).ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Returns the trimmed stderr of a command output, falling back to stdout
/// when stderr is empty.
#[must_use]
pub fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_owned()
    } else {
        stderr.to_owned()
    }
}

/// Renders an argv for display in remediation hints.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
