//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::debrid::ResolvedDownload;
use crate::downloader::{staging_path, DownloadError, DownloadedFile, Downloader};

const DEFAULT_CONTENT: &[u8] = b"mock content";

/// Mock implementation of the `Downloader` trait.
///
/// Writes canned content into the staging folder instead of fetching the URL.
/// Failures can be injected per filename, and an artificial delay lets tests
/// observe how many transfers run at once.
#[derive(Debug, Default)]
pub struct MockDownloader {
    requests: Arc<RwLock<Vec<ResolvedDownload>>>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    contents: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each transfer sleeps for `delay` before writing.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Transfers of `filename` fail with a stream error.
    pub async fn fail_on(&self, filename: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(filename.to_string(), message.to_string());
    }

    pub async fn set_content(&self, filename: &str, content: &[u8]) {
        self.contents
            .write()
            .await
            .insert(filename.to_string(), content.to_vec());
    }

    /// Downloads requested so far, in call order.
    pub async fn requests(&self) -> Vec<ResolvedDownload> {
        self.requests.read().await.clone()
    }

    /// Highest number of transfers observed running together.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        resolved: &ResolvedDownload,
        staging: &Path,
    ) -> Result<DownloadedFile, DownloadError> {
        self.requests.write().await.push(resolved.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.write(resolved, staging).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockDownloader {
    async fn write(
        &self,
        resolved: &ResolvedDownload,
        staging: &Path,
    ) -> Result<DownloadedFile, DownloadError> {
        if let Some(message) = self.failures.read().await.get(&resolved.filename) {
            return Err(DownloadError::Stream(message.clone()));
        }

        let dest = staging_path(staging, &resolved.filename)?;
        let content = self
            .contents
            .read()
            .await
            .get(&resolved.filename)
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONTENT.to_vec());

        tokio::fs::write(&dest, &content)
            .await
            .map_err(|source| DownloadError::Io {
                path: dest.clone(),
                source,
            })?;

        Ok(DownloadedFile {
            path: dest,
            bytes: content.len() as u64,
            elapsed: Duration::ZERO,
        })
    }
}
