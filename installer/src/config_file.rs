//! Default configuration materialisation.
//!
//! The configuration file belongs to the operator once it exists: it is
//! written with create-new semantics and never touched again.

use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};

/// Configuration written on first install.
pub const DEFAULT_CONFIG: &str = include_str!("../templates/openclaw.json");

/// What [`ensure_config`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOutcome {
    /// The template was written.
    Created,
    /// A file already existed and was left alone.
    Preserved,
}

/// Writes `template` to `path` unless something already exists there.
///
/// # Errors
///
/// Returns [`InstallerError::ConfigWrite`] on filesystem errors other than
/// the file already existing.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use coqui_installer::config_file::{ConfigOutcome, ensure_config};
///
/// let dir = tempfile::tempdir()?;
/// let path = Utf8PathBuf::try_from(dir.path().join("openclaw.json")).unwrap();
/// assert_eq!(ensure_config(&path, "{}")?, ConfigOutcome::Created);
/// assert_eq!(ensure_config(&path, "{\"x\":1}")?, ConfigOutcome::Preserved);
/// assert_eq!(std::fs::read_to_string(&path)?, "{}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn ensure_config(path: &Utf8Path, template: &str) -> Result<ConfigOutcome> {
    create_new_with(path, |file| {
        file.write_all(template.as_bytes())?;
        file.flush()
    })
}

/// Creates `path` and fills it with `write`. A failed write removes the
/// file again; a truncated file would otherwise be preserved forever.
fn create_new_with(
    path: &Utf8Path,
    write: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> Result<ConfigOutcome> {
    let write_error = |source| InstallerError::ConfigWrite {
        path: path.to_owned(),
        source,
    };
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!("keeping existing configuration at {path}");
            return Ok(ConfigOutcome::Preserved);
        }
        Err(err) => return Err(write_error(err)),
    };
    if let Err(err) = write(&mut file) {
        drop(file);
        if let Err(cleanup) = std::fs::remove_file(path) {
            debug!("could not remove incomplete configuration at {path}: {cleanup}");
        }
        return Err(write_error(err));
    }
    Ok(ConfigOutcome::Created)
}
