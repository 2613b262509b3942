//! Error types for the Coqui installer.
//!
//! This module defines semantic error variants that provide actionable guidance
//! to operators when installation fails. Every variant is fatal: the pipeline
//! stops at the first error and a re-run resumes idempotently. Variants that
//! have a manual fix expose it through [`InstallerError::remediation`].

use crate::download::DownloadError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur during the installation process.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The host operating system is neither Linux nor macOS.
    #[error("unsupported operating system: {os}")]
    UnsupportedPlatform {
        /// Operating system identifier reported by the host.
        os: String,
    },

    /// The host is a first-generation Windows Subsystem for Linux kernel.
    #[error("unsupported compatibility layer: WSL 1 kernel {kernel}")]
    UnsupportedCompatibilityLayer {
        /// Kernel release string that identified the layer.
        kernel: String,
    },

    /// The operator declined to install a required dependency.
    #[error("{dependency} is required but installation was declined")]
    MissingDependencyDeclined {
        /// Name of the declined dependency.
        dependency: &'static str,
        /// Command the operator can run to install it manually.
        remediation: String,
    },

    /// No usable package manager can install the dependency.
    #[error("no supported package manager available to install {dependency}")]
    PackageManagerUnavailable {
        /// Name of the dependency that could not be installed.
        dependency: &'static str,
        /// Manual installation guidance for the platform.
        guidance: String,
    },

    /// A selective install step needs a dependency that is not present.
    #[error("{dependency} must be installed first; re-run with {flag}")]
    PrerequisiteMissing {
        /// Name of the missing prerequisite.
        dependency: &'static str,
        /// CLI flag that installs the prerequisite.
        flag: &'static str,
    },

    /// A command needs root privileges and neither root nor sudo is available.
    #[error("{command} requires root privileges and sudo is not available")]
    PrivilegeUnavailable {
        /// Command line that needed elevation.
        command: String,
    },

    /// A downloaded artefact failed its integrity check.
    #[error("integrity verification failed for {artefact}: {reason}")]
    IntegrityVerification {
        /// Name of the rejected artefact.
        artefact: &'static str,
        /// Description of the mismatch.
        reason: String,
    },

    /// A network download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Git clone, fetch, or update operation failed.
    #[error("git {operation} failed: {message}")]
    Git {
        /// The git operation that failed (clone, fetch, pull, etc.).
        operation: &'static str,
        /// Description of the failure.
        message: String,
        /// Install root the operation ran against.
        root: Utf8PathBuf,
    },

    /// Required tool installation failed.
    #[error("failed to install {tool}: {message}")]
    DependencyInstall {
        /// Name of the tool that failed to install.
        tool: &'static str,
        /// Description of the installation failure.
        message: String,
    },

    /// A dependency's introspection output could not be understood.
    #[error("could not inspect {dependency}: {reason}")]
    DependencyProbe {
        /// Name of the probed dependency.
        dependency: &'static str,
        /// Description of the parse failure.
        reason: String,
    },

    /// The install root could not be determined.
    #[error("cannot determine the install directory: {reason}")]
    InstallRoot {
        /// Why resolution failed.
        reason: String,
    },

    /// The default configuration document could not be written.
    #[error("failed to write configuration {path}")]
    ConfigWrite {
        /// Destination of the configuration document.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Launcher publication failed in every candidate directory.
    #[error("launcher publication failed: {0}")]
    LauncherPublish(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl InstallerError {
    /// Returns the manual remediation line for this error, if one exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use coqui_installer::error::InstallerError;
    ///
    /// let err = InstallerError::MissingDependencyDeclined {
    ///     dependency: "git",
    ///     remediation: "sudo apt-get install -y git".to_owned(),
    /// };
    /// assert_eq!(err.remediation().as_deref(), Some("sudo apt-get install -y git"));
    /// ```
    #[must_use]
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::UnsupportedCompatibilityLayer { .. } => {
                Some("upgrade the distribution to WSL 2: wsl --set-version <distro> 2".to_owned())
            }
            Self::MissingDependencyDeclined { remediation, .. } => Some(remediation.clone()),
            Self::PackageManagerUnavailable { guidance, .. } => Some(guidance.clone()),
            Self::PrivilegeUnavailable { .. } => {
                Some("re-run the installer as root or install sudo".to_owned())
            }
            Self::Git { root, .. } => Some(format!(
                "remove {root} and re-run the installer for a clean install"
            )),
            Self::InstallRoot { .. } => {
                Some("set COQUI_INSTALL_DIR to an absolute path".to_owned())
            }
            Self::Download(_) => {
                Some("check network connectivity and re-run the installer".to_owned())
            }
            _ => None,
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
