//! SHA-384 verification of downloaded payloads.
//!
//! The Composer installer script is the only artefact the installer executes
//! after downloading it, and it is run only after its digest matches the
//! published signature.

use crate::error::{InstallerError, Result};
use log::{debug, warn};
use sha2::{Digest, Sha384};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Expected length of a hex-encoded SHA-384 digest.
const DIGEST_HEX_LEN: usize = 96;

/// A validated hex-encoded SHA-384 digest string.
///
/// # Examples
///
/// ```
/// use coqui_installer::integrity::Sha384Digest;
///
/// let hex = "ab".repeat(48);
/// let digest = Sha384Digest::try_from(hex.as_str()).unwrap();
/// assert_eq!(digest.as_str().len(), 96);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha384Digest(String);

impl Sha384Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Error returned for malformed digest text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid SHA-384 digest: {reason}")]
pub struct InvalidDigest {
    reason: String,
}

impl TryFrom<&str> for Sha384Digest {
    type Error = InvalidDigest;

    /// Accepts surrounding whitespace and upper-case hex, normalising to
    /// lower case; the signature file ends with a newline.
    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let value = value.trim();
        if value.len() != DIGEST_HEX_LEN {
            return Err(InvalidDigest {
                reason: format!(
                    "expected {DIGEST_HEX_LEN} hex characters, got {}",
                    value.len()
                ),
            });
        }
        if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(InvalidDigest {
                reason: format!("non-hex character '{bad}'"),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl fmt::Display for Sha384Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the SHA-384 digest of a file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn digest_file(path: &Path) -> io::Result<Sha384Digest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha384::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Sha384Digest(hex::encode(hasher.finalize())))
}

/// Verifies `path` against `expected`, deleting the file on mismatch.
///
/// # Errors
///
/// Returns [`InstallerError::IntegrityVerification`] when the digests differ
/// and an I/O error when the file cannot be read.
pub fn verify_payload(artefact: &'static str, path: &Path, expected: &Sha384Digest) -> Result<()> {
    let actual = digest_file(path)?;
    if actual == *expected {
        debug!("{artefact} digest verified: {actual}");
        return Ok(());
    }
    if let Err(err) = std::fs::remove_file(path) {
        warn!("could not remove rejected {artefact} at {}: {err}", path.display());
    }
    Err(InstallerError::IntegrityVerification {
        artefact,
        reason: format!("expected {expected}, got {actual}"),
    })
}
