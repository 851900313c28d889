//! Job status polling.

use tracing::{info, warn};

use super::retry::RetryPolicy;
use super::types::{DebridError, JobId, LinkEntry, ResolutionClient};

/// Result of polling a job.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The job reached the ready state.
    Ready(Vec<LinkEntry>),
    /// The attempt budget ran out before the job was ready.
    Exhausted {
        attempts: u32,
        last_status: Option<String>,
        /// Error from the most recent failed status query, if any.
        last_error: Option<DebridError>,
    },
}

impl PollOutcome {
    /// Links to download; empty unless the job is ready.
    pub fn into_links(self) -> Vec<LinkEntry> {
        match self {
            PollOutcome::Ready(links) => links,
            _ => Vec::new(),
        }
    }
}

/// Polls `job` until it is ready or `policy` is used up.
///
/// Every failed status query, transport error or rejected envelope alike,
/// consumes one attempt and is retried on the next tick.
pub async fn poll_until_ready(
    client: &dyn ResolutionClient,
    job: &JobId,
    policy: &RetryPolicy,
) -> PollOutcome {
    let mut last_status = None;
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        match client.status(job).await {
            Ok(status) if status.is_ready() => {
                info!(
                    job_id = %job,
                    links = status.links.len(),
                    attempt = attempt + 1,
                    "Job is ready"
                );
                return PollOutcome::Ready(status.links);
            }
            Ok(status) => {
                info!(job_id = %job, status = %status.status, attempt = attempt + 1, "Job not ready");
                last_status = Some(status.status);
            }
            Err(e) => {
                warn!(job_id = %job, error = %e, kind = e.kind(), attempt = attempt + 1, "Poll error");
                last_error = Some(e);
            }
        }

        tokio::time::sleep(policy.delay_for(attempt)).await;
    }

    PollOutcome::Exhausted {
        attempts: policy.max_attempts,
        last_status,
        last_error,
    }
}
