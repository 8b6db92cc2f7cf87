//! HTTP downloads of release archives.
//!
//! The response body is streamed into a temporary file next to the
//! destination and renamed into place once complete, so an interrupted
//! download never leaves a truncated archive where the extractor expects a
//! whole one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::application::platform::PlatformError;

/// Connection timeout for downloads.  Transfers themselves are unbounded:
/// release archives can be large on slow links.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for downloads.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request failed or the server answered with an error status.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The body could not be written to disk.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<DownloadError> for PlatformError {
    fn from(e: DownloadError) -> Self {
        PlatformError::Download(e.to_string())
    }
}

/// Blocking HTTP(S) downloader.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDownloader {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .user_agent(concat!("devsetup/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }

    /// Downloads `url` to `dest`, creating parent directories, and returns
    /// the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Request`] for network and HTTP errors and
    /// [`DownloadError::Io`] if the file cannot be written.  `dest` is left
    /// untouched on error.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| DownloadError::Request {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let io_err = |source| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        let bytes = io::copy(&mut response.into_reader(), &mut tmp).map_err(io_err)?;
        tmp.persist(dest).map_err(|e| io_err(e.error))?;

        debug!(url, path = %dest.display(), bytes, "download complete");
        Ok(bytes)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_invalid_url_is_request_error_and_writes_nothing() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("archive.zip");

        // Act
        let result = HttpDownloader::new().fetch("not a url", &dest);

        // Assert
        assert!(matches!(result, Err(DownloadError::Request { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_fetch_unreachable_host_is_request_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("archive.zip");

        // Port 9 on loopback (discard) is closed on CI machines.
        let result = HttpDownloader::new().fetch("http://127.0.0.1:9/archive.zip", &dest);

        assert!(matches!(result, Err(DownloadError::Request { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_download_error_converts_to_platform_error() {
        let err: PlatformError = DownloadError::Io {
            path: PathBuf::from("nvim.zip"),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        }
        .into();
        assert!(matches!(err, PlatformError::Download(msg) if msg.contains("nvim.zip")));
    }
}
