//! Immutable run configuration.
//!
//! The CLI flags and the `COQUI_*` environment variables are read exactly
//! once, here, and every later stage receives the resulting [`RunConfig`]
//! by reference.

use crate::cli::Cli;
use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use camino::Utf8PathBuf;

/// Repository cloned when `COQUI_REPO_URL` is unset.
pub const DEFAULT_REPO_URL: &str = "https://github.com/AgentCoqui/coqui.git";

/// Overrides the repository URL.
pub const ENV_REPO_URL: &str = "COQUI_REPO_URL";
/// Overrides the install root.
pub const ENV_INSTALL_DIR: &str = "COQUI_INSTALL_DIR";
/// Pins a branch or tag.
pub const ENV_VERSION: &str = "COQUI_VERSION";

/// Directory name of the default install root under the data directory.
const INSTALL_DIR_NAME: &str = "coqui";

/// Configuration file name, relative to the install root.
pub const CONFIG_FILE_NAME: &str = "openclaw.json";

/// Entry point script, relative to the install root.
pub const ENTRY_POINT: &str = "bin/coqui";

/// Steps requested by the selective flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// `--install-php`.
    pub php: bool,
    /// `--install-composer`.
    pub composer: bool,
    /// `--install-coqui`.
    pub coqui: bool,
}

/// Which parts of the pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Every stage in order.
    Full,
    /// Only the requested stages, each checking its prerequisites.
    Selective(Selection),
}

/// Settings for one installer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Which stages run.
    pub mode: InstallMode,
    /// Whether every confirmation is answered yes.
    pub non_interactive: bool,
    /// Whether progress output is suppressed.
    pub quiet: bool,
    /// Repository to clone.
    pub repo_url: String,
    /// Where Coqui is installed.
    pub install_root: Utf8PathBuf,
    /// Branch or tag to install; `None` follows the remote default.
    pub version_pin: Option<String>,
}

impl RunConfig {
    /// Builds the configuration from parsed flags and the environment.
    ///
    /// Empty environment values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InstallRoot`] when no install root can be
    /// derived or the derived path is not valid UTF-8.
    pub fn from_cli(cli: &Cli, dirs: &dyn BaseDirs) -> Result<Self> {
        let install_root = match env_value(ENV_INSTALL_DIR) {
            Some(dir) => Utf8PathBuf::from(dir),
            None => default_install_root(dirs)?,
        };
        Ok(Self {
            mode: cli.mode(),
            non_interactive: cli.non_interactive,
            quiet: cli.quiet,
            repo_url: env_value(ENV_REPO_URL).unwrap_or_else(|| DEFAULT_REPO_URL.to_owned()),
            install_root,
            version_pin: env_value(ENV_VERSION),
        })
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> Utf8PathBuf {
        self.install_root.join(CONFIG_FILE_NAME)
    }

    /// Path of the entry point script the launcher points at.
    #[must_use]
    pub fn entry_point(&self) -> Utf8PathBuf {
        self.install_root.join(ENTRY_POINT)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn default_install_root(dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let data_dir = dirs.data_dir().ok_or_else(|| InstallerError::InstallRoot {
        reason: "no data directory for the current user".to_owned(),
    })?;
    let root = Utf8PathBuf::try_from(data_dir.join(INSTALL_DIR_NAME)).map_err(|err| {
        InstallerError::InstallRoot {
            reason: format!("path is not valid UTF-8: {}", err.as_path().display()),
        }
    })?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubDirs;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> (TempDir, StubDirs) {
        let temp = TempDir::new().expect("temp dir");
        let dirs = StubDirs::new(temp.path());
        (temp, dirs)
    }

    #[rstest]
    fn defaults_come_from_data_dir(scratch: (TempDir, StubDirs)) {
        let (_temp, dirs) = scratch;
        temp_env::with_vars_unset([ENV_REPO_URL, ENV_INSTALL_DIR, ENV_VERSION], || {
            let config = RunConfig::from_cli(&Cli::default(), &dirs).expect("config");

            assert_eq!(config.mode, InstallMode::Full);
            assert_eq!(config.repo_url, DEFAULT_REPO_URL);
            assert_eq!(
                config.install_root.as_std_path(),
                dirs.data().join("coqui")
            );
            assert!(config.version_pin.is_none());
        });
    }

    #[rstest]
    fn environment_overrides_defaults(scratch: (TempDir, StubDirs)) {
        let (_temp, dirs) = scratch;
        temp_env::with_vars(
            [
                (ENV_REPO_URL, Some("https://example.test/fork.git")),
                (ENV_INSTALL_DIR, Some("/opt/coqui")),
                (ENV_VERSION, Some("v0.3.0")),
            ],
            || {
                let cli = Cli {
                    non_interactive: true,
                    ..Cli::default()
                };
                let config = RunConfig::from_cli(&cli, &dirs).expect("config");

                assert!(config.non_interactive);
                assert_eq!(config.repo_url, "https://example.test/fork.git");
                assert_eq!(config.install_root, Utf8PathBuf::from("/opt/coqui"));
                assert_eq!(config.version_pin.as_deref(), Some("v0.3.0"));
                assert_eq!(config.config_path(), Utf8PathBuf::from("/opt/coqui/openclaw.json"));
                assert_eq!(config.entry_point(), Utf8PathBuf::from("/opt/coqui/bin/coqui"));
            },
        );
    }

    #[rstest]
    fn blank_environment_values_are_ignored(scratch: (TempDir, StubDirs)) {
        let (_temp, dirs) = scratch;
        temp_env::with_vars(
            [
                (ENV_REPO_URL, Some("  ")),
                (ENV_INSTALL_DIR, None),
                (ENV_VERSION, Some("")),
            ],
            || {
                let config = RunConfig::from_cli(&Cli::default(), &dirs).expect("config");
                assert_eq!(config.repo_url, DEFAULT_REPO_URL);
                assert!(config.version_pin.is_none());
            },
        );
    }
}
