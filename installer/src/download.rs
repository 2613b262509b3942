//! HTTP downloads for the Composer bootstrap.
//!
//! Provides a trait-based abstraction so the Composer reconciler can be
//! exercised without network access.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Location of the Composer installer script.
pub const COMPOSER_INSTALLER_URL: &str = "https://getcomposer.org/installer";

/// Location of the published SHA-384 signature of the installer script.
pub const COMPOSER_SIGNATURE_URL: &str = "https://composer.github.io/installer.sig";

/// Transport timeout applied by the HTTP client to each request.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for fetching remote resources.
///
/// # Examples
///
/// ```no_run
/// use coqui_installer::download::{COMPOSER_SIGNATURE_URL, Downloader, HttpDownloader};
///
/// let signature = HttpDownloader.fetch_text(COMPOSER_SIGNATURE_URL)?;
/// println!("{}", signature.trim());
/// # Ok::<(), coqui_installer::download::DownloadError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Downloader {
    /// Downloads `url` and returns the body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not text.
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError>;

    /// Downloads `url` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or file write fails.
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered 404.
    #[error("resource not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        log::debug!("fetching {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }

    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!("downloading {url} to {}", dest.display());
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)?;
        Ok(())
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composer_urls_use_https() {
        assert!(COMPOSER_INSTALLER_URL.starts_with("https://"));
        assert!(COMPOSER_SIGNATURE_URL.starts_with("https://"));
    }

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error(COMPOSER_SIGNATURE_URL, &err);
        assert!(matches!(mapped, DownloadError::NotFound { url } if url == COMPOSER_SIGNATURE_URL));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(503);
        let mapped = map_ureq_error(COMPOSER_INSTALLER_URL, &err);
        assert!(matches!(mapped, DownloadError::HttpError { .. }));
    }
}
