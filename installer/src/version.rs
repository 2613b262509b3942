//! Major/minor version values used by requirement checks.

use std::fmt;
use std::str::FromStr;

/// A `major.minor` version; patch components are ignored.
///
/// # Examples
///
/// ```
/// use coqui_installer::version::Version;
///
/// let found: Version = "8.3.12".parse().unwrap();
/// assert!(found < Version::new(8, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u32,
    minor: u32,
}

impl Version {
    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Finds the first whitespace-separated token in `text` that parses as a
    /// version, e.g. `2.8.4` in `Composer version 2.8.4 2024-12-11`.
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        text.split_whitespace()
            .map(|token| token.trim_start_matches('v'))
            .find_map(|token| token.parse().ok())
    }
}

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version: {0:?}")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let major = parts.next().and_then(|p| p.parse().ok());
        // Minor may carry a suffix such as "4-dev" or "4RC1".
        let minor = parts.next().and_then(|p| {
            let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        });
        match (major, minor) {
            (Some(major), Some(minor)) => Ok(Self { major, minor }),
            _ => Err(ParseVersionError(s.to_owned())),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
