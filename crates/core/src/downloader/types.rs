//! Downloader types and trait.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::debrid::ResolvedDownload;

/// Errors from a single transfer.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid target filename: {0:?}")]
    InvalidFilename(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Transfer interrupted: {0}")]
    Stream(String),

    #[error("Transfer timed out")]
    Timeout,

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownloadError::Timeout
        } else {
            DownloadError::Request(e.to_string())
        }
    }
}

/// A finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Location in the staging folder.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
    pub elapsed: Duration,
}

impl DownloadedFile {
    pub fn size_mib(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }

    /// Average speed in MiB/s, with elapsed time clamped to 0.1s.
    pub fn speed_mib(&self) -> f64 {
        self.size_mib() / self.elapsed.as_secs_f64().max(0.1)
    }
}

/// Fetches resolved links to local files.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Downloads `resolved` into `staging`, named after its filename.
    ///
    /// On failure no partial file is left behind.
    async fn download(
        &self,
        resolved: &ResolvedDownload,
        staging: &Path,
    ) -> Result<DownloadedFile, DownloadError>;
}

/// Resolves the staging path for a remote filename.
///
/// Only the final path component is used, so a filename can never place
/// a file outside the staging folder.
pub fn staging_path(staging: &Path, filename: &str) -> Result<PathBuf, DownloadError> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DownloadError::InvalidFilename(filename.to_string()))?;
    Ok(staging.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_path() {
        let staging = Path::new("/data/downloads");
        assert_eq!(
            staging_path(staging, "Game [0100ABCD00000000][v0].nsp").unwrap(),
            staging.join("Game [0100ABCD00000000][v0].nsp")
        );
        assert_eq!(
            staging_path(staging, "../../etc/passwd").unwrap(),
            staging.join("passwd")
        );
        assert!(matches!(
            staging_path(staging, ".."),
            Err(DownloadError::InvalidFilename(_))
        ));
        assert!(staging_path(staging, "").is_err());
    }
}
