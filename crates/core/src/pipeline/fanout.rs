//! Concurrent download of a job's links.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::debrid::{LinkEntry, ResolutionClient};
use crate::downloader::Downloader;
use crate::library::FileRouter;
use crate::metrics::FILES_ROUTED;

use super::types::LinkOutcome;

/// Unlocks, downloads and routes every link, returning once all are done.
///
/// Each link runs as its own task; at most `max_concurrent` run at once
/// (0 means one permit per link). A failing link never cancels its
/// siblings. Outcomes are returned in the order of `links`.
pub async fn download_all(
    links: Vec<LinkEntry>,
    resolver: Arc<dyn ResolutionClient>,
    downloader: Arc<dyn Downloader>,
    router: Arc<FileRouter>,
    staging: PathBuf,
    max_concurrent: usize,
) -> Vec<LinkOutcome> {
    let permits = if max_concurrent == 0 {
        links.len().max(1)
    } else {
        max_concurrent
    };
    let semaphore = Arc::new(Semaphore::new(permits));
    let labels: Vec<String> = links.iter().map(|l| l.link.clone()).collect();
    let mut tasks = JoinSet::new();

    for (index, link) in links.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let resolver = Arc::clone(&resolver);
        let downloader = Arc::clone(&downloader);
        let router = Arc::clone(&router);
        let staging = staging.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let outcome = fetch_one(&link, &*resolver, &*downloader, &router, &staging).await;
            (index, outcome)
        });
    }

    let mut outcomes: Vec<Option<LinkOutcome>> = vec![None; labels.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => error!(error = %e, "Download task panicked"),
        }
    }

    outcomes
        .into_iter()
        .zip(labels)
        .map(|(outcome, link)| {
            outcome.unwrap_or_else(|| LinkOutcome::TransferFailed {
                link,
                filename: String::new(),
                error: "task aborted".to_string(),
            })
        })
        .collect()
}

async fn fetch_one(
    link: &LinkEntry,
    resolver: &dyn ResolutionClient,
    downloader: &dyn Downloader,
    router: &FileRouter,
    staging: &std::path::Path,
) -> LinkOutcome {
    let resolved = match resolver.unlock(link).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(link = %link.label(), error = %e, "Unlock failed");
            return LinkOutcome::UnlockFailed {
                link: link.link.clone(),
                error: e.to_string(),
            };
        }
    };

    info!(link = %link.label(), file = %resolved.filename, size = resolved.size, "Downloading");

    let downloaded = match downloader.download(&resolved, staging).await {
        Ok(downloaded) => downloaded,
        Err(e) => {
            return LinkOutcome::TransferFailed {
                link: link.link.clone(),
                filename: resolved.filename,
                error: e.to_string(),
            };
        }
    };

    match router.route(&downloaded.path).await {
        Ok(routed) => {
            FILES_ROUTED
                .with_label_values(&[routed.disposition.as_str()])
                .inc();
            LinkOutcome::Routed {
                link: link.link.clone(),
                filename: resolved.filename,
                bytes: downloaded.bytes,
                disposition: routed.disposition,
                path: routed.path,
            }
        }
        Err(e) => {
            warn!(file = %resolved.filename, error = %e, "Failed to route download");
            LinkOutcome::RouteFailed {
                link: link.link.clone(),
                filename: resolved.filename,
                error: e.to_string(),
            }
        }
    }
}
