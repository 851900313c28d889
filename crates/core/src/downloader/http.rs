//! Streaming HTTP downloader.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, trace, warn};

use crate::config::DownloaderConfig;
use crate::debrid::ResolvedDownload;
use crate::metrics::{BYTES_DOWNLOADED, DOWNLOADS_COMPLETED, DOWNLOADS_FAILED};

use super::progress::TransferProgress;
use super::types::{staging_path, DownloadError, DownloadedFile, Downloader};

/// Downloads direct URLs with `reqwest`, writing in `chunk_size` blocks.
pub struct HttpDownloader {
    client: Client,
    chunk_size: usize,
}

impl HttpDownloader {
    pub fn new(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| DownloadError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            chunk_size: config.chunk_size.max(1),
        })
    }

    /// Fetches `resolved` into `dest`. Only a file this call created is
    /// removed on failure, so an earlier file of the same name survives a
    /// request that fails before the body arrives.
    async fn transfer(
        &self,
        resolved: &ResolvedDownload,
        dest: &Path,
    ) -> Result<DownloadedFile, DownloadError> {
        let response = self.client.get(&resolved.url).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                status: response.status().as_u16(),
                url: resolved.url.clone(),
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| DownloadError::Io {
                path: dest.to_path_buf(),
                source,
            })?;

        let result = self.write_body(response, &mut file, resolved, dest).await;
        drop(file);

        match result {
            Ok(progress) => Ok(DownloadedFile {
                path: dest.to_path_buf(),
                bytes: progress.downloaded(),
                elapsed: progress.elapsed(),
            }),
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %dest.display(), error = %remove_err, "Failed to remove partial file");
                    }
                }
                Err(e)
            }
        }
    }

    async fn write_body(
        &self,
        response: reqwest::Response,
        file: &mut tokio::fs::File,
        resolved: &ResolvedDownload,
        dest: &Path,
    ) -> Result<TransferProgress, DownloadError> {
        let io_err = |source| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let mut progress = TransferProgress::start(resolved.size);
        let mut buffer = Vec::with_capacity(self.chunk_size);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    DownloadError::Timeout
                } else {
                    DownloadError::Stream(e.to_string())
                }
            })?;

            let mut rest = &chunk[..];
            while !rest.is_empty() {
                let take = (self.chunk_size - buffer.len()).min(rest.len());
                buffer.extend_from_slice(&rest[..take]);
                rest = &rest[take..];

                if buffer.len() == self.chunk_size {
                    file.write_all(&buffer).await.map_err(io_err)?;
                    progress.record(buffer.len());
                    buffer.clear();
                    log_chunk(&resolved.filename, &progress);
                }
            }
        }

        if !buffer.is_empty() {
            file.write_all(&buffer).await.map_err(io_err)?;
            progress.record(buffer.len());
            log_chunk(&resolved.filename, &progress);
        }
        file.flush().await.map_err(io_err)?;

        Ok(progress)
    }
}

fn log_chunk(filename: &str, progress: &TransferProgress) {
    let snap = progress.snapshot();
    trace!(
        file = filename,
        percent = %format!("{:.1}", snap.percent),
        speed_mb_s = %format!("{:.2}", snap.throughput_mib()),
        eta_secs = %format!("{:.1}", snap.eta_secs),
        "Download progress"
    );
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn name(&self) -> &str {
        "http"
    }

    async fn download(
        &self,
        resolved: &ResolvedDownload,
        staging: &Path,
    ) -> Result<DownloadedFile, DownloadError> {
        let dest = staging_path(staging, &resolved.filename)?;

        match self.transfer(resolved, &dest).await {
            Ok(done) => {
                DOWNLOADS_COMPLETED.inc();
                BYTES_DOWNLOADED.inc_by(done.bytes);
                info!(
                    file = %resolved.filename,
                    size_mb = %format!("{:.2}", done.size_mib()),
                    speed_mb_s = %format!("{:.2}", done.speed_mib()),
                    "Finished download"
                );
                Ok(done)
            }
            Err(e) => {
                DOWNLOADS_FAILED.inc();
                warn!(file = %resolved.filename, error = %e, "Download failed");
                Err(e)
            }
        }
    }
}
