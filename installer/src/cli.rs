//! CLI argument definitions for the Coqui installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::run_config::{InstallMode, Selection};
use clap::Parser;

/// Install Coqui and the tools it needs.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "coqui-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install Coqui and the tools it needs.\n\n",
    "The installer checks for PHP 8.4+ with the curl, mbstring, xml, zip and ",
    "sqlite3 extensions, Composer 2.2+ and git, installing whatever is missing ",
    "with the system package manager. It then clones or updates the Coqui ",
    "repository, installs its Composer dependencies, writes a default ",
    "configuration if none exists and puts a `coqui` launcher on your PATH.\n\n",
    "Re-running the installer is safe: satisfied steps are skipped and an ",
    "existing configuration is never overwritten.",
))]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  COQUI_REPO_URL      Git URL to clone [default: https://github.com/AgentCoqui/coqui.git]\n",
    "  COQUI_INSTALL_DIR   Install root [default: <data dir>/coqui]\n",
    "  COQUI_VERSION       Branch or tag to install [default: remote default branch]\n",
    "  COQUI_INSTALLER_LOG Log filter, e.g. debug\n\n",
    "EXAMPLES:\n",
    "  Full install, answering yes to every prompt:\n",
    "    $ coqui-installer -y\n\n",
    "  Only make sure PHP and Composer are present:\n",
    "    $ coqui-installer --install-php --install-composer\n\n",
    "  Install a tagged release:\n",
    "    $ COQUI_VERSION=v0.3.0 coqui-installer\n",
))]
pub struct Cli {
    /// Only reconcile the PHP runtime and its extensions.
    #[arg(long)]
    pub install_php: bool,

    /// Only reconcile Composer (PHP must already be installed).
    #[arg(long)]
    pub install_composer: bool,

    /// Only install Coqui itself (PHP and Composer must already be installed).
    #[arg(long)]
    pub install_coqui: bool,

    /// Answer yes to every prompt.
    #[arg(short = 'y', long, alias = "yes")]
    pub non_interactive: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (warnings and errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Returns the install mode selected by the flags.
    ///
    /// # Examples
    ///
    /// ```
    /// use coqui_installer::cli::Cli;
    /// use coqui_installer::run_config::InstallMode;
    ///
    /// assert_eq!(Cli::default().mode(), InstallMode::Full);
    ///
    /// let cli = Cli { install_composer: true, ..Cli::default() };
    /// assert!(matches!(cli.mode(), InstallMode::Selective(s) if s.composer && !s.php));
    /// ```
    #[must_use]
    pub fn mode(&self) -> InstallMode {
        if self.install_php || self.install_composer || self.install_coqui {
            InstallMode::Selective(Selection {
                php: self.install_php,
                composer: self.install_composer,
                coqui: self.install_coqui,
            })
        } else {
            InstallMode::Full
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
