//! Platform directory resolution.
//!
//! Every filesystem location the installer derives from the host goes
//! through [`BaseDirs`] so tests can point the installer at temporary
//! directories.

use directories_next::{BaseDirs as SysDirs, UserDirs};
use std::path::PathBuf;

/// Resolves host directories used by the installer.
pub trait BaseDirs {
    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Per-user data directory (`~/.local/share` on Linux,
    /// `~/Library/Application Support` on macOS).
    fn data_dir(&self) -> Option<PathBuf>;

    /// System-wide directory for executables on the search path.
    fn system_bin_dir(&self) -> Option<PathBuf>;

    /// Per-user directory for executables, normally `~/.local/bin`.
    fn user_bin_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }

    fn data_dir(&self) -> Option<PathBuf> {
        SysDirs::new().map(|dirs| dirs.data_dir().to_path_buf())
    }

    fn system_bin_dir(&self) -> Option<PathBuf> {
        if cfg!(unix) {
            Some(PathBuf::from("/usr/local/bin"))
        } else {
            None
        }
    }

    fn user_bin_dir(&self) -> Option<PathBuf> {
        // `executable_dir` is only defined on Linux; macOS users get the
        // same XDG-style location.
        SysDirs::new()
            .and_then(|dirs| dirs.executable_dir().map(PathBuf::from))
            .or_else(|| self.home_dir().map(|home| home.join(".local").join("bin")))
    }
}
