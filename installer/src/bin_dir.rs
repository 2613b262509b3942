//! Search-path directory selection shared by the Composer bootstrap and the
//! launcher publisher.

use crate::dirs::BaseDirs;
use crate::privilege::Privilege;
use log::debug;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A candidate directory for an executable, in preference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The installer can write to the directory itself.
    Direct(PathBuf),
    /// Writing needs `sudo`.
    Elevated(PathBuf),
}

impl Placement {
    /// The target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        match self {
            Self::Direct(dir) | Self::Elevated(dir) => dir,
        }
    }

    /// Whether writing needs `sudo`.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        matches!(self, Self::Elevated(_))
    }
}

/// Returns the candidate directories, system-wide first.
///
/// The system directory is offered directly when writable, via `sudo` when
/// it is not and `sudo` exists, and skipped otherwise. The user-local
/// directory always comes last.
pub fn placements(dirs: &dyn BaseDirs, privilege: Privilege) -> Vec<Placement> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(system) = dirs.system_bin_dir() {
        if is_writable(&system) {
            candidates.push(Placement::Direct(system));
        } else if privilege == Privilege::Sudo {
            candidates.push(Placement::Elevated(system));
        } else {
            debug!("skipping unwritable {}", system.display());
        }
    }
    if let Some(user) = dirs.user_bin_dir() {
        candidates.push(Placement::Direct(user));
    }
    candidates
}

/// Returns true if a file can be created in `dir`.
#[must_use]
pub fn is_writable(dir: &Path) -> bool {
    dir.is_dir() && tempfile::Builder::new().prefix(".coqui-probe").tempfile_in(dir).is_ok()
}

/// Checks whether `dir` is one of the entries of a `PATH` value.
///
/// # Examples
///
/// ```
/// use coqui_installer::bin_dir::is_directory_in_path;
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// let path = OsStr::new("/usr/bin:/usr/local/bin");
/// assert!(is_directory_in_path(Path::new("/usr/local/bin"), Some(path)));
/// assert!(!is_directory_in_path(Path::new("/opt/bin"), Some(path)));
/// ```
#[must_use]
pub fn is_directory_in_path(dir: &Path, path_var: Option<&OsStr>) -> bool {
    path_var.is_some_and(|path| std::env::split_paths(path).any(|entry| entry == dir))
}

/// Returns the shell line that adds `bin_dir` to `PATH`.
#[must_use]
pub fn path_instructions(bin_dir: &Path) -> String {
    #[cfg(windows)]
    {
        format!(
            concat!(
                "Add the following directory to your PATH:\n",
                "  {}"
            ),
            bin_dir.display()
        )
    }
    #[cfg(not(windows))]
    {
        format!(
            concat!(
                "Add the following to your shell profile (~/.bashrc or ~/.zshrc):\n",
                "  export PATH=\"{}:$PATH\""
            ),
            bin_dir.display()
        )
    }
}
