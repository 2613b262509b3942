//! Privilege resolution for commands that must run as root.

use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, render_command, stdout_of};
use log::debug;

/// How root-only commands can be executed on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// The installer already runs as root; no prefix is needed.
    Root,
    /// Commands are prefixed with `sudo`.
    Sudo,
    /// Neither root nor `sudo` is available.
    Unavailable,
}

impl Privilege {
    /// Determines the effective user and whether `sudo` can be used.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use coqui_installer::exec::SystemCommandExecutor;
    /// use coqui_installer::privilege::Privilege;
    ///
    /// let privilege = Privilege::resolve(&SystemCommandExecutor);
    /// println!("{privilege:?}");
    /// ```
    pub fn resolve(executor: &dyn CommandExecutor) -> Self {
        let uid = stdout_of(executor, "id", &["-u"]);
        debug!("effective uid: {uid:?}");
        if uid.as_deref() == Some("0") {
            Self::Root
        } else if executor.which("sudo").is_some() {
            Self::Sudo
        } else {
            Self::Unavailable
        }
    }

    /// Wraps a command so it runs with root privileges.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::PrivilegeUnavailable`] when neither root nor
    /// `sudo` is available.
    pub fn elevate(self, program: &str, args: &[String]) -> Result<(String, Vec<String>)> {
        match self {
            Self::Root => Ok((program.to_owned(), args.to_vec())),
            Self::Sudo => {
                let mut sudo_args = Vec::with_capacity(args.len() + 1);
                sudo_args.push(program.to_owned());
                sudo_args.extend(args.iter().cloned());
                Ok(("sudo".to_owned(), sudo_args))
            }
            Self::Unavailable => Err(InstallerError::PrivilegeUnavailable {
                command: render_command(program, args),
            }),
        }
    }

    /// Renders a command the way an operator would type it on this host.
    #[must_use]
    pub fn render(self, elevate: bool, program: &str, args: &[String]) -> String {
        let command = render_command(program, args);
        if elevate && self != Self::Root {
            format!("sudo {command}")
        } else {
            command
        }
    }
}
