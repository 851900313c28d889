//! Mock resolution service for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::debrid::{
    DebridError, JobId, JobStatus, LinkEntry, ResolutionClient, ResolvedDownload,
};
use crate::descriptor::MagnetReference;

/// Mock implementation of the `ResolutionClient` trait.
///
/// Provides controllable behavior for testing:
/// - Track submitted magnets and unlocked links for assertions
/// - Script the status sequence of a job
/// - Simulate submit and unlock failures
///
/// Jobs are numbered `job-1`, `job-2`, ... in submission order. A job with no
/// scripted statuses reports the default status (`In Queue` unless changed).
#[derive(Debug)]
pub struct MockResolutionClient {
    submitted: Arc<RwLock<Vec<MagnetReference>>>,
    submit_error: Arc<RwLock<Option<DebridError>>>,
    statuses: Arc<RwLock<HashMap<JobId, VecDeque<Result<JobStatus, DebridError>>>>>,
    default_status: Arc<RwLock<JobStatus>>,
    status_calls: Arc<RwLock<HashMap<JobId, u32>>>,
    unlock_results: Arc<RwLock<HashMap<String, Result<ResolvedDownload, DebridError>>>>,
    unlocked: Arc<RwLock<Vec<LinkEntry>>>,
}

impl Default for MockResolutionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResolutionClient {
    pub fn new() -> Self {
        Self {
            submitted: Arc::new(RwLock::new(Vec::new())),
            submit_error: Arc::new(RwLock::new(None)),
            statuses: Arc::new(RwLock::new(HashMap::new())),
            default_status: Arc::new(RwLock::new(JobStatus::new("In Queue"))),
            status_calls: Arc::new(RwLock::new(HashMap::new())),
            unlock_results: Arc::new(RwLock::new(HashMap::new())),
            unlocked: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Magnets submitted so far.
    pub async fn submitted(&self) -> Vec<MagnetReference> {
        self.submitted.read().await.clone()
    }

    /// Every later submit fails with `error`.
    pub async fn set_submit_error(&self, error: DebridError) {
        *self.submit_error.write().await = Some(error);
    }

    /// Queues status results for `job`, consumed one per poll.
    pub async fn push_statuses(&self, job: &JobId, results: Vec<Result<JobStatus, DebridError>>) {
        self.statuses
            .write()
            .await
            .entry(job.clone())
            .or_default()
            .extend(results);
    }

    /// Status reported once a job's queue is empty.
    pub async fn set_default_status(&self, status: JobStatus) {
        *self.default_status.write().await = status;
    }

    pub async fn status_calls(&self, job: &JobId) -> u32 {
        self.status_calls.read().await.get(job).copied().unwrap_or(0)
    }

    /// Total status calls across all jobs.
    pub async fn total_status_calls(&self) -> u32 {
        self.status_calls.read().await.values().sum()
    }

    /// Overrides the unlock result for a shared link.
    pub async fn set_unlock(&self, link: &str, result: Result<ResolvedDownload, DebridError>) {
        self.unlock_results
            .write()
            .await
            .insert(link.to_string(), result);
    }

    /// Links unlocked so far, including failed attempts.
    pub async fn unlocked(&self) -> Vec<LinkEntry> {
        self.unlocked.read().await.clone()
    }

    /// Whether any remote call has been made.
    pub async fn was_called(&self) -> bool {
        !self.submitted.read().await.is_empty()
            || self.total_status_calls().await > 0
            || !self.unlocked.read().await.is_empty()
    }
}

#[async_trait]
impl ResolutionClient for MockResolutionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, magnet: &MagnetReference) -> Result<JobId, DebridError> {
        let mut submitted = self.submitted.write().await;
        submitted.push(magnet.clone());

        if let Some(error) = self.submit_error.read().await.clone() {
            return Err(error);
        }
        Ok(JobId::new(format!("job-{}", submitted.len())))
    }

    async fn status(&self, job: &JobId) -> Result<JobStatus, DebridError> {
        *self
            .status_calls
            .write()
            .await
            .entry(job.clone())
            .or_insert(0) += 1;

        let scripted = self
            .statuses
            .write()
            .await
            .get_mut(job)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(result) => result,
            None => Ok(self.default_status.read().await.clone()),
        }
    }

    async fn unlock(&self, link: &LinkEntry) -> Result<ResolvedDownload, DebridError> {
        self.unlocked.write().await.push(link.clone());

        if let Some(result) = self.unlock_results.read().await.get(&link.link) {
            return result.clone();
        }

        let filename = link
            .filename
            .clone()
            .or_else(|| link.link.rsplit('/').next().map(str::to_string))
            .unwrap_or_else(|| "download.bin".to_string());

        Ok(ResolvedDownload {
            url: link.link.clone(),
            filename,
            size: link.size.unwrap_or(1),
        })
    }
}
