//! Package-manager capability interface.
//!
//! The platform detector picks exactly one [`PackageManagerKind`]; its
//! concrete [`PackageManager`] implementation is then injected into every
//! reconciler, so command syntax differences stay local to this module.

use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, failure_message};
use crate::privilege::Privilege;
use log::debug;
use std::cell::Cell;
use std::fmt;

/// Package managers the installer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManagerKind {
    /// Debian, Ubuntu and derivatives.
    Apt,
    /// Fedora, RHEL 8+ and derivatives.
    Dnf,
    /// Older RHEL and CentOS releases.
    Yum,
    /// Arch Linux and derivatives.
    Pacman,
    /// Alpine Linux.
    Apk,
    /// Homebrew on macOS.
    Homebrew,
    /// Nix profile installs, the generic fallback on both platforms.
    Nix,
    /// No supported package manager was found on the search path.
    None,
}

impl PackageManagerKind {
    /// Linux probe order; the first resolvable binary wins.
    pub const LINUX_PRIORITY: [Self; 6] = [
        Self::Apt,
        Self::Dnf,
        Self::Yum,
        Self::Pacman,
        Self::Apk,
        Self::Nix,
    ];

    /// macOS probe order; the first resolvable binary wins.
    pub const MACOS_PRIORITY: [Self; 2] = [Self::Homebrew, Self::Nix];

    /// Returns the binary whose presence identifies this manager.
    #[must_use]
    pub const fn binary(self) -> Option<&'static str> {
        match self {
            Self::Apt => Some("apt-get"),
            Self::Dnf => Some("dnf"),
            Self::Yum => Some("yum"),
            Self::Pacman => Some("pacman"),
            Self::Apk => Some("apk"),
            Self::Homebrew => Some("brew"),
            Self::Nix => Some("nix-env"),
            Self::None => None,
        }
    }

    /// Builds the concrete manager for this kind.
    ///
    /// Returns `None` for [`PackageManagerKind::None`]; callers must handle
    /// the absence explicitly.
    ///
    /// # Examples
    ///
    /// ```
    /// use coqui_installer::package_manager::PackageManagerKind;
    ///
    /// let manager = PackageManagerKind::Apt.manager().expect("apt is concrete");
    /// assert_eq!(manager.kind(), PackageManagerKind::Apt);
    /// assert!(PackageManagerKind::None.manager().is_none());
    /// ```
    #[must_use]
    pub fn manager(self) -> Option<Box<dyn PackageManager>> {
        match self {
            Self::Apt => Some(Box::new(Apt::default())),
            Self::Dnf => Some(Box::new(Dnf)),
            Self::Yum => Some(Box::new(Yum)),
            Self::Pacman => Some(Box::new(Pacman)),
            Self::Apk => Some(Box::new(Apk)),
            Self::Homebrew => Some(Box::new(Homebrew)),
            Self::Nix => Some(Box::new(Nix)),
            Self::None => None,
        }
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Apk => "apk",
            Self::Homebrew => "Homebrew",
            Self::Nix => "Nix",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Capability interface over a host package manager.
pub trait PackageManager {
    /// Returns the kind this implementation drives.
    fn kind(&self) -> PackageManagerKind;

    /// Whether install commands must run as root.
    fn requires_root(&self) -> bool;

    /// Whether PHP extensions ship inside the runtime package and may stay
    /// unavailable regardless of what the installer requests.
    fn bundles_extensions(&self) -> bool {
        false
    }

    /// Returns the program and arguments that install `packages`.
    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>);

    /// Returns an index refresh to run before the next install, if any.
    fn refresh_command(&self) -> Option<(&'static str, Vec<String>)> {
        None
    }

    /// Returns true when the manager's binary resolves on the search path.
    fn probe(&self, executor: &dyn CommandExecutor) -> bool {
        self.kind()
            .binary()
            .is_some_and(|binary| executor.which(binary).is_some())
    }

    /// Installs `packages`, elevating through `privilege` when required.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::PrivilegeUnavailable`] when root is needed
    /// but unavailable, and [`InstallerError::DependencyInstall`] when the
    /// package manager exits non-zero.
    fn install_packages(
        &self,
        executor: &dyn CommandExecutor,
        privilege: Privilege,
        tool: &'static str,
        packages: &[String],
    ) -> Result<()> {
        if let Some((program, args)) = self.refresh_command() {
            run_manager_command(executor, privilege, self.requires_root(), tool, program, &args)?;
        }
        let (program, args) = self.install_command(packages);
        run_manager_command(executor, privilege, self.requires_root(), tool, program, &args)
    }
}

fn run_manager_command(
    executor: &dyn CommandExecutor,
    privilege: Privilege,
    elevate: bool,
    tool: &'static str,
    program: &str,
    args: &[String],
) -> Result<()> {
    let (program, args) = if elevate {
        privilege.elevate(program, args)?
    } else {
        (program.to_owned(), args.to_vec())
    };
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    debug!("package manager: {program} {}", arg_refs.join(" "));
    let output = executor.run(&program, &arg_refs)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(InstallerError::DependencyInstall {
            tool,
            message: failure_message(&output),
        })
    }
}

fn prefixed(prefix: &[&str], packages: &[String]) -> Vec<String> {
    prefix
        .iter()
        .map(|arg| (*arg).to_owned())
        .chain(packages.iter().cloned())
        .collect()
}

/// `apt-get` with a once-per-process index refresh.
#[derive(Debug, Default)]
pub struct Apt {
    refreshed: Cell<bool>,
}

impl PackageManager for Apt {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Apt
    }

    fn requires_root(&self) -> bool {
        true
    }

    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>) {
        ("apt-get", prefixed(&["install", "-y"], packages))
    }

    fn refresh_command(&self) -> Option<(&'static str, Vec<String>)> {
        if self.refreshed.replace(true) {
            None
        } else {
            Some(("apt-get", vec!["update".to_owned()]))
        }
    }
}

/// `dnf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dnf;

impl PackageManager for Dnf {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Dnf
    }

    fn requires_root(&self) -> bool {
        true
    }

    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>) {
        ("dnf", prefixed(&["install", "-y"], packages))
    }
}

/// `yum`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yum;

impl PackageManager for Yum {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Yum
    }

    fn requires_root(&self) -> bool {
        true
    }

    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>) {
        ("yum", prefixed(&["install", "-y"], packages))
    }
}

/// `pacman`; its `php` package compiles most extensions in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacman;

impl PackageManager for Pacman {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Pacman
    }

    fn requires_root(&self) -> bool {
        true
    }

    fn bundles_extensions(&self) -> bool {
        true
    }

    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>) {
        ("pacman", prefixed(&["-S", "--needed", "--noconfirm"], packages))
    }
}

/// `apk`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apk;

impl PackageManager for Apk {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Apk
    }

    fn requires_root(&self) -> bool {
        true
    }

    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>) {
        ("apk", prefixed(&["add", "--no-cache"], packages))
    }
}

/// Homebrew; refuses to run as root and bundles PHP extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Homebrew;

impl PackageManager for Homebrew {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Homebrew
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn bundles_extensions(&self) -> bool {
        true
    }

    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>) {
        ("brew", prefixed(&["install"], packages))
    }
}

/// `nix-env` user profile installs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nix;

impl PackageManager for Nix {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Nix
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn bundles_extensions(&self) -> bool {
        true
    }

    fn install_command(&self, packages: &[String]) -> (&'static str, Vec<String>) {
        ("nix-env", prefixed(&["-iA"], packages))
    }
}
