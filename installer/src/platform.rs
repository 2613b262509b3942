//! Host platform detection.
//!
//! Detection runs once at startup and produces an immutable
//! [`PlatformProfile`]. Host facts (OS name, `/etc/os-release`, kernel
//! release) are gathered separately from their interpretation so the
//! classification rules can be tested without the host.

use crate::error::{InstallerError, Result};
use crate::exec::CommandExecutor;
use crate::package_manager::PackageManagerKind;
use log::debug;
use std::fmt;

/// Operating systems the installer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsKind {
    /// Linux, including WSL 2.
    Linux,
    /// macOS.
    MacOs,
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("Linux"),
            Self::MacOs => f.write_str("macOS"),
        }
    }
}

/// Kernel flavour as read from the kernel release string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelVariant {
    /// A regular kernel.
    Native,
    /// First-generation Windows Subsystem for Linux (syscall translation).
    Wsl1,
    /// Windows Subsystem for Linux 2 (real Linux kernel in a VM).
    Wsl2,
}

/// Immutable snapshot of the host, captured once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    os: OsKind,
    arch: String,
    distro_id: String,
    distro_version: String,
    wsl: bool,
    package_manager: PackageManagerKind,
}

impl PlatformProfile {
    /// Creates a profile for a native host with no distribution details.
    ///
    /// # Examples
    ///
    /// ```
    /// use coqui_installer::package_manager::PackageManagerKind;
    /// use coqui_installer::platform::{OsKind, PlatformProfile};
    ///
    /// let profile = PlatformProfile::new(OsKind::MacOs, "aarch64", PackageManagerKind::Homebrew);
    /// assert_eq!(profile.package_manager(), PackageManagerKind::Homebrew);
    /// assert!(profile.distro_id().is_empty());
    /// ```
    #[must_use]
    pub fn new(os: OsKind, arch: &str, package_manager: PackageManagerKind) -> Self {
        Self {
            os,
            arch: arch.to_owned(),
            distro_id: String::new(),
            distro_version: String::new(),
            wsl: false,
            package_manager,
        }
    }

    /// Operating system kind.
    #[must_use]
    pub const fn os(&self) -> OsKind {
        self.os
    }

    /// Machine architecture, e.g. `x86_64`.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Linux distribution id (`ubuntu`, `fedora`, ...); empty elsewhere.
    #[must_use]
    pub fn distro_id(&self) -> &str {
        &self.distro_id
    }

    /// Linux distribution version; empty elsewhere.
    #[must_use]
    pub fn distro_version(&self) -> &str {
        &self.distro_version
    }

    /// True when running under WSL 2.
    #[must_use]
    pub const fn is_wsl(&self) -> bool {
        self.wsl
    }

    /// The detected package manager.
    #[must_use]
    pub const fn package_manager(&self) -> PackageManagerKind {
        self.package_manager
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.os, self.arch)?;
        if !self.distro_id.is_empty() {
            write!(f, " ({} {})", self.distro_id, self.distro_version)?;
        }
        if self.wsl {
            f.write_str(" under WSL 2")?;
        }
        write!(f, ", package manager: {}", self.package_manager)
    }
}

/// Raw facts read from the host.
#[derive(Debug, Clone, Default)]
pub struct HostFacts {
    /// `std::env::consts::OS` value.
    pub os: String,
    /// `std::env::consts::ARCH` value.
    pub arch: String,
    /// Contents of `/etc/os-release`, if readable.
    pub os_release: Option<String>,
    /// Contents of `/proc/sys/kernel/osrelease`, if readable.
    pub kernel_release: Option<String>,
}

impl HostFacts {
    /// Reads facts from the running host.
    #[must_use]
    pub fn gather() -> Self {
        Self {
            os: std::env::consts::OS.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
            os_release: std::fs::read_to_string("/etc/os-release").ok(),
            kernel_release: std::fs::read_to_string("/proc/sys/kernel/osrelease").ok(),
        }
    }
}

/// Detects the running host.
///
/// # Errors
///
/// Returns [`InstallerError::UnsupportedPlatform`] outside Linux and macOS and
/// [`InstallerError::UnsupportedCompatibilityLayer`] on WSL 1.
pub fn detect(executor: &dyn CommandExecutor) -> Result<PlatformProfile> {
    detect_with(&HostFacts::gather(), executor)
}

/// Builds a profile from pre-gathered host facts.
///
/// # Errors
///
/// See [`detect`].
pub fn detect_with(facts: &HostFacts, executor: &dyn CommandExecutor) -> Result<PlatformProfile> {
    let os = match facts.os.as_str() {
        "linux" => OsKind::Linux,
        "macos" => OsKind::MacOs,
        other => {
            return Err(InstallerError::UnsupportedPlatform {
                os: other.to_owned(),
            });
        }
    };

    let mut wsl = false;
    if os == OsKind::Linux
        && let Some(kernel) = facts.kernel_release.as_deref()
    {
        match classify_kernel(kernel) {
            KernelVariant::Wsl1 => {
                return Err(InstallerError::UnsupportedCompatibilityLayer {
                    kernel: kernel.trim().to_owned(),
                });
            }
            KernelVariant::Wsl2 => wsl = true,
            KernelVariant::Native => {}
        }
    }

    let (distro_id, distro_version) = match (os, facts.os_release.as_deref()) {
        (OsKind::Linux, Some(text)) => parse_os_release(text),
        _ => (String::new(), String::new()),
    };

    let package_manager = select_package_manager(os, executor);
    let profile = PlatformProfile {
        os,
        arch: facts.arch.clone(),
        distro_id,
        distro_version,
        wsl,
        package_manager,
    };
    debug!("detected platform: {profile}");
    Ok(profile)
}

/// Extracts `ID` and `VERSION_ID` from an os-release document.
///
/// # Examples
///
/// ```
/// use coqui_installer::platform::parse_os_release;
///
/// let (id, version) = parse_os_release("NAME=\"Ubuntu\"\nID=ubuntu\nVERSION_ID=\"24.04\"\n");
/// assert_eq!(id, "ubuntu");
/// assert_eq!(version, "24.04");
/// ```
#[must_use]
pub fn parse_os_release(text: &str) -> (String, String) {
    let mut id = String::new();
    let mut version = String::new();
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = value.trim().trim_matches('"').to_lowercase();
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            value.trim().trim_matches('"').clone_into(&mut version);
        }
    }
    (id, version)
}

/// Classifies a kernel release string.
#[must_use]
pub fn classify_kernel(release: &str) -> KernelVariant {
    let lower = release.to_lowercase();
    if !lower.contains("microsoft") {
        return KernelVariant::Native;
    }
    if lower.contains("wsl2") || lower.contains("microsoft-standard") {
        KernelVariant::Wsl2
    } else {
        KernelVariant::Wsl1
    }
}

/// Probes the fixed priority list for `os` and returns the first manager
/// whose binary resolves, or [`PackageManagerKind::None`].
pub fn select_package_manager(os: OsKind, executor: &dyn CommandExecutor) -> PackageManagerKind {
    let candidates: &[PackageManagerKind] = match os {
        OsKind::Linux => &PackageManagerKind::LINUX_PRIORITY,
        OsKind::MacOs => &PackageManagerKind::MACOS_PRIORITY,
    };
    candidates
        .iter()
        .copied()
        .find(|kind| kind.manager().is_some_and(|manager| manager.probe(executor)))
        .unwrap_or(PackageManagerKind::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockCommandExecutor;
    use rstest::rstest;
    use std::path::PathBuf;

    fn executor_with(binaries: &'static [&'static str]) -> MockCommandExecutor {
        let mut executor = MockCommandExecutor::new();
        executor.expect_which().returning(move |binary| {
            binaries
                .iter()
                .any(|known| *known == binary)
                .then(|| PathBuf::from("/usr/bin").join(binary))
        });
        executor
    }

    fn linux_facts(kernel: &str) -> HostFacts {
        HostFacts {
            os: "linux".to_owned(),
            arch: "x86_64".to_owned(),
            os_release: Some("ID=debian\nVERSION_ID=\"12\"\n".to_owned()),
            kernel_release: Some(kernel.to_owned()),
        }
    }

    #[rstest]
    #[case("6.8.0-45-generic", KernelVariant::Native)]
    #[case("4.4.0-19041-Microsoft", KernelVariant::Wsl1)]
    #[case("5.15.153.1-microsoft-standard-WSL2", KernelVariant::Wsl2)]
    fn classifies_kernel_release(#[case] release: &str, #[case] expected: KernelVariant) {
        assert_eq!(classify_kernel(release), expected);
    }

    #[rstest]
    #[case(&["apt-get", "dnf", "nix-env"], PackageManagerKind::Apt)]
    #[case(&["yum", "dnf"], PackageManagerKind::Dnf)]
    #[case(&["pacman", "nix-env"], PackageManagerKind::Pacman)]
    #[case(&["apk"], PackageManagerKind::Apk)]
    #[case(&["nix-env"], PackageManagerKind::Nix)]
    #[case(&[], PackageManagerKind::None)]
    fn linux_priority_picks_first_resolvable(
        #[case] binaries: &'static [&'static str],
        #[case] expected: PackageManagerKind,
    ) {
        let executor = executor_with(binaries);
        assert_eq!(select_package_manager(OsKind::Linux, &executor), expected);
    }

    #[test]
    fn macos_ignores_linux_managers() {
        let executor = executor_with(&["apt-get", "nix-env"]);
        assert_eq!(
            select_package_manager(OsKind::MacOs, &executor),
            PackageManagerKind::Nix
        );
    }

    #[test]
    fn detect_rejects_windows() {
        let executor = executor_with(&[]);
        let facts = HostFacts {
            os: "windows".to_owned(),
            ..HostFacts::default()
        };
        let err = detect_with(&facts, &executor).expect_err("windows is unsupported");
        assert!(matches!(err, InstallerError::UnsupportedPlatform { os } if os == "windows"));
    }

    #[test]
    fn detect_rejects_wsl1() {
        let executor = executor_with(&["apt-get"]);
        let err = detect_with(&linux_facts("4.4.0-19041-Microsoft\n"), &executor)
            .expect_err("WSL 1 is unsupported");
        assert!(matches!(
            err,
            InstallerError::UnsupportedCompatibilityLayer { kernel } if kernel == "4.4.0-19041-Microsoft"
        ));
    }

    #[test]
    fn detect_accepts_wsl2_and_reads_distro() {
        let executor = executor_with(&["apt-get"]);
        let profile = detect_with(
            &linux_facts("5.15.153.1-microsoft-standard-WSL2"),
            &executor,
        )
        .expect("WSL 2 is supported");
        assert!(profile.is_wsl());
        assert_eq!(profile.distro_id(), "debian");
        assert_eq!(profile.distro_version(), "12");
        assert_eq!(profile.package_manager(), PackageManagerKind::Apt);
    }

    #[test]
    fn detect_without_package_manager_is_not_an_error() {
        let executor = executor_with(&[]);
        let profile =
            detect_with(&linux_facts("6.8.0"), &executor).expect("detection succeeds");
        assert_eq!(profile.package_manager(), PackageManagerKind::None);
    }

    #[test]
    fn macos_profile_has_no_distro() {
        let executor = executor_with(&["brew"]);
        let facts = HostFacts {
            os: "macos".to_owned(),
            arch: "aarch64".to_owned(),
            os_release: Some("ID=ignored\n".to_owned()),
            kernel_release: None,
        };
        let profile = detect_with(&facts, &executor).expect("macOS is supported");
        assert_eq!(profile.os(), OsKind::MacOs);
        assert!(profile.distro_id().is_empty());
        assert_eq!(profile.package_manager(), PackageManagerKind::Homebrew);
    }
}
