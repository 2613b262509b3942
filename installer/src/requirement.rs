//! Static requirement tables for the managed dependencies.
//!
//! A [`RequirementSpec`] says what "satisfied" means for a dependency and
//! which packages provide it under each package manager. Command syntax is
//! not recorded here; that belongs to [`crate::package_manager`].

use crate::package_manager::PackageManagerKind;
use crate::version::Version;

/// Packages that provide a dependency under one package manager.
#[derive(Debug, Clone, Copy)]
pub struct PackageMapping {
    /// The manager this mapping applies to.
    pub manager: PackageManagerKind,
    /// Packages always installed.
    pub packages: &'static [&'static str],
    /// Capability name to package name; capabilities missing from this
    /// table are assumed to ship with the base packages.
    pub capabilities: &'static [(&'static str, &'static str)],
}

/// What a dependency must look like once reconciled.
#[derive(Debug, Clone, Copy)]
pub struct RequirementSpec {
    /// Display name.
    pub name: &'static str,
    /// Binary used for introspection.
    pub binary: &'static str,
    /// Minimum accepted version, if any.
    pub min_version: Option<Version>,
    /// Required capabilities, e.g. PHP extension names.
    pub capabilities: &'static [&'static str],
    /// Package tables per manager.
    pub mappings: &'static [PackageMapping],
    /// Shown when no package manager can install the dependency.
    pub manual_hint: &'static str,
}

impl RequirementSpec {
    /// Returns the mapping for `kind`, if the dependency is packaged there.
    #[must_use]
    pub fn mapping(&self, kind: PackageManagerKind) -> Option<&PackageMapping> {
        self.mappings.iter().find(|mapping| mapping.manager == kind)
    }

    /// Resolves the deduplicated package list for `kind`.
    ///
    /// # Examples
    ///
    /// ```
    /// use coqui_installer::package_manager::PackageManagerKind;
    /// use coqui_installer::requirement::PHP;
    ///
    /// let packages = PHP.packages_for(PackageManagerKind::Dnf).unwrap();
    /// assert_eq!(packages[0], "php-cli");
    /// assert!(packages.contains(&"php-pecl-zip".to_owned()));
    /// assert!(PHP.packages_for(PackageManagerKind::None).is_none());
    /// ```
    #[must_use]
    pub fn packages_for(&self, kind: PackageManagerKind) -> Option<Vec<String>> {
        let mapping = self.mapping(kind)?;
        let mut packages: Vec<String> = Vec::new();
        let capability_packages = self.capabilities.iter().filter_map(|capability| {
            mapping
                .capabilities
                .iter()
                .find(|(name, _)| name == capability)
                .map(|(_, package)| *package)
        });
        for package in mapping.packages.iter().copied().chain(capability_packages) {
            if !packages.iter().any(|existing| existing == package) {
                packages.push(package.to_owned());
            }
        }
        Some(packages)
    }
}

/// Extensions Coqui needs at runtime.
pub const PHP_EXTENSIONS: &[&str] = &["curl", "mbstring", "xml", "zip", "sqlite3"];

const RPM_PHP_EXTENSIONS: &[(&str, &str)] = &[
    ("curl", "php-common"),
    ("mbstring", "php-mbstring"),
    ("xml", "php-xml"),
    ("zip", "php-pecl-zip"),
    ("sqlite3", "php-pdo"),
];

/// The PHP runtime.
pub const PHP: RequirementSpec = RequirementSpec {
    name: "PHP",
    binary: "php",
    min_version: Some(Version::new(8, 4)),
    capabilities: PHP_EXTENSIONS,
    mappings: &[
        PackageMapping {
            manager: PackageManagerKind::Apt,
            packages: &["php-cli"],
            capabilities: &[
                ("curl", "php-curl"),
                ("mbstring", "php-mbstring"),
                ("xml", "php-xml"),
                ("zip", "php-zip"),
                ("sqlite3", "php-sqlite3"),
            ],
        },
        PackageMapping {
            manager: PackageManagerKind::Dnf,
            packages: &["php-cli"],
            capabilities: RPM_PHP_EXTENSIONS,
        },
        PackageMapping {
            manager: PackageManagerKind::Yum,
            packages: &["php-cli"],
            capabilities: RPM_PHP_EXTENSIONS,
        },
        PackageMapping {
            manager: PackageManagerKind::Pacman,
            packages: &["php"],
            capabilities: &[("sqlite3", "php-sqlite")],
        },
        PackageMapping {
            manager: PackageManagerKind::Apk,
            packages: &["php84", "php84-phar", "php84-openssl", "php84-iconv"],
            capabilities: &[
                ("curl", "php84-curl"),
                ("mbstring", "php84-mbstring"),
                ("xml", "php84-xml"),
                ("zip", "php84-zip"),
                ("sqlite3", "php84-sqlite3"),
            ],
        },
        PackageMapping {
            manager: PackageManagerKind::Homebrew,
            packages: &["php"],
            capabilities: &[],
        },
        PackageMapping {
            manager: PackageManagerKind::Nix,
            packages: &["nixpkgs.php84"],
            capabilities: &[],
        },
    ],
    manual_hint: "install PHP 8.4 or newer with the curl, mbstring, xml, zip and sqlite3 extensions: https://www.php.net/downloads",
};

/// git.
pub const GIT: RequirementSpec = RequirementSpec {
    name: "git",
    binary: "git",
    min_version: None,
    capabilities: &[],
    mappings: &[
        PackageMapping {
            manager: PackageManagerKind::Apt,
            packages: &["git"],
            capabilities: &[],
        },
        PackageMapping {
            manager: PackageManagerKind::Dnf,
            packages: &["git"],
            capabilities: &[],
        },
        PackageMapping {
            manager: PackageManagerKind::Yum,
            packages: &["git"],
            capabilities: &[],
        },
        PackageMapping {
            manager: PackageManagerKind::Pacman,
            packages: &["git"],
            capabilities: &[],
        },
        PackageMapping {
            manager: PackageManagerKind::Apk,
            packages: &["git"],
            capabilities: &[],
        },
        PackageMapping {
            manager: PackageManagerKind::Homebrew,
            packages: &["git"],
            capabilities: &[],
        },
        PackageMapping {
            manager: PackageManagerKind::Nix,
            packages: &["nixpkgs.git"],
            capabilities: &[],
        },
    ],
    manual_hint: "install git: https://git-scm.com/downloads",
};

/// Composer; bootstrapped from getcomposer.org rather than a package.
pub const COMPOSER: RequirementSpec = RequirementSpec {
    name: "Composer",
    binary: "composer",
    min_version: Some(Version::new(2, 2)),
    capabilities: &[],
    mappings: &[],
    manual_hint: "install Composer: https://getcomposer.org/download/",
};
