//! Pipeline driver implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::debrid::{poll_until_ready, PollOutcome, ResolutionClient};
use crate::descriptor::parse_descriptor;
use crate::downloader::Downloader;
use crate::library::{FileRouter, Library, LibraryError};
use crate::metrics::{DESCRIPTORS_PROCESSED, DESCRIPTOR_DURATION};

use super::fanout::download_all;
use super::types::{DescriptorReport, DescriptorState, PipelineError};

/// Drives watch-folder descriptors through the acquisition lifecycle.
pub struct PipelineDriver {
    config: Arc<Config>,
    resolver: Arc<dyn ResolutionClient>,
    downloader: Arc<dyn Downloader>,
    library: Library,
    router: Arc<FileRouter>,
}

impl PipelineDriver {
    pub fn new(
        config: Arc<Config>,
        resolver: Arc<dyn ResolutionClient>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        let library = Library::new(&config.folders.library);
        let router = Arc::new(FileRouter::new(
            &config.folders.library,
            &config.folders.complete,
            &config.downloader.library_extensions,
        ));

        Self {
            config,
            resolver,
            downloader,
            library,
            router,
        }
    }

    /// Scans the watch folder every `scan_interval_ms` until shutdown.
    ///
    /// Shutdown abandons whatever is in flight: a descriptor being polled or
    /// downloaded stays in the watch folder and partial staging files are left
    /// behind.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let interval = Duration::from_millis(self.config.pipeline.scan_interval_ms);
        info!(
            watch = %self.config.folders.watch.display(),
            resolver = self.resolver.name(),
            "Pipeline driver started"
        );

        loop {
            let tick = async {
                if let Err(e) = self.scan_once().await {
                    warn!(error = %e, "Watch folder scan failed");
                }
                tokio::time::sleep(interval).await;
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Pipeline driver received shutdown signal");
                    break;
                }
                _ = tick => {}
            }
        }

        info!("Pipeline driver stopped");
    }

    /// Candidate descriptors in the watch folder, in file name order.
    pub async fn candidates(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let watch = &self.config.folders.watch;
        let list_failed = |e| LibraryError::ListFailed {
            path: watch.clone(),
            source: e,
        };

        let mut entries = tokio::fs::read_dir(watch).await.map_err(list_failed)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_failed)? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && self.config.pipeline.is_candidate(&name) {
                names.push(name);
            }
        }
        names.sort();

        Ok(names.into_iter().map(|name| watch.join(name)).collect())
    }

    /// Processes every current candidate once, sequentially.
    pub async fn scan_once(&self) -> Result<Vec<DescriptorReport>, PipelineError> {
        let candidates = self.candidates().await?;
        if !candidates.is_empty() {
            debug!(count = candidates.len(), "Found descriptors");
        }

        let mut reports = Vec::with_capacity(candidates.len());
        for path in candidates {
            reports.push(self.process_descriptor(&path).await);
        }
        Ok(reports)
    }

    /// Drives one descriptor to a terminal state.
    pub async fn process_descriptor(&self, path: &Path) -> DescriptorReport {
        let started = Instant::now();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(descriptor = %name, "Found descriptor");

        let report = self.drive(path, DescriptorReport::new(name)).await;
        let outcome = report.state().as_str();

        DESCRIPTORS_PROCESSED.with_label_values(&[outcome]).inc();
        DESCRIPTOR_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());

        match report.state() {
            DescriptorState::Abandoned => warn!(
                descriptor = %report.descriptor,
                error = report.error.as_deref().unwrap_or("unknown"),
                "Descriptor abandoned, left in watch folder"
            ),
            state => info!(descriptor = %report.descriptor, state = state.as_str(), "Descriptor done"),
        }

        report
    }

    async fn drive(&self, path: &Path, mut report: DescriptorReport) -> DescriptorReport {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                return report.abandon(PipelineError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let descriptor = match parse_descriptor(path, &bytes) {
            Ok(descriptor) => descriptor,
            Err(e) => return report.abandon(e.into()),
        };
        report.enter(DescriptorState::Parsed);

        report.tag = descriptor.content_tag();
        if let Some(tag) = &report.tag {
            match self.library.find_duplicate(tag).await {
                Ok(Some(existing)) => {
                    info!(descriptor = %report.descriptor, tag = %tag, existing = %existing, "Duplicate, skipping");
                    report.duplicate_of = Some(existing);
                    if let Err(e) = self.router.discard_descriptor(path).await {
                        return report.abandon(e.into());
                    }
                    report.enter(DescriptorState::Skipped);
                    return report;
                }
                Ok(None) => {}
                Err(e) => return report.abandon(e.into()),
            }
        }
        report.enter(DescriptorState::DedupChecked);

        let magnet = match descriptor.magnet() {
            Ok(magnet) => magnet,
            Err(e) => return report.abandon(e.into()),
        };
        report.enter(DescriptorState::MagnetDerived);

        let job = match self.resolver.submit(&magnet).await {
            Ok(job) => job,
            Err(e) => return report.abandon(PipelineError::Submit(e)),
        };
        report.job_id = Some(job.clone());
        report.enter(DescriptorState::Submitted);

        report.enter(DescriptorState::Polling);
        let links = match poll_until_ready(&*self.resolver, &job, &self.config.debrid.poll).await {
            PollOutcome::Ready(links) => links,
            PollOutcome::Exhausted {
                attempts,
                last_status,
                last_error,
            } => {
                warn!(
                    descriptor = %report.descriptor,
                    job_id = %job,
                    attempts = attempts,
                    last_status = last_status.as_deref().unwrap_or("none"),
                    last_error = %last_error.map(|e| e.to_string()).unwrap_or_else(|| "none".to_string()),
                    "Job never became ready"
                );
                Vec::new()
            }
        };
        report.enter(DescriptorState::LinksResolved);

        report.enter(DescriptorState::Downloading);
        report.links = download_all(
            links,
            Arc::clone(&self.resolver),
            Arc::clone(&self.downloader),
            Arc::clone(&self.router),
            self.config.folders.downloads.clone(),
            self.config.downloader.max_concurrent,
        )
        .await;

        match self.router.archive_descriptor(path).await {
            Ok(archived) => {
                info!(descriptor = %report.descriptor, to = %archived.display(), "Descriptor archived");
                report.enter(DescriptorState::Archived);
                report
            }
            Err(e) => report.abandon(e.into()),
        }
    }
}
