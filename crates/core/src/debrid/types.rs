//! Types for resolution service operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::descriptor::MagnetReference;

/// Errors that can occur while talking to a resolution service.
#[derive(Debug, Clone, Error)]
pub enum DebridError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Rejected by service ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DebridError {
    /// Whether the same call may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout | Self::Transport(_) | Self::InvalidResponse(_)
        )
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "connection_failed",
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for DebridError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_connect() {
            DebridError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            DebridError::InvalidResponse(e.to_string())
        } else {
            DebridError::Transport(e.to_string())
        }
    }
}

/// Opaque identifier of a remote job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status string reported by the service once a job has links.
pub const READY_STATUS: &str = "Ready";

/// Snapshot of a remote job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Open-ended status text ("In Queue", "Downloading", "Ready", ...).
    pub status: String,
    /// Shared links, populated once ready.
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

impl JobStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            links: Vec::new(),
        }
    }

    pub fn ready(links: Vec<LinkEntry>) -> Self {
        Self {
            status: READY_STATUS.to_string(),
            links,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == READY_STATUS
    }
}

/// A shared link belonging to a ready job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl LinkEntry {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            filename: None,
            size: None,
        }
    }

    /// Name used in logs before the link is unlocked.
    pub fn label(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.link)
    }
}

/// A shared link exchanged for a direct URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDownload {
    pub url: String,
    pub filename: String,
    /// Expected size in bytes; 1 when the service does not report it.
    pub size: u64,
}

/// A resolution service that can submit, poll and unlock.
#[async_trait]
pub trait ResolutionClient: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Submits a magnet and returns the id of the created job.
    async fn submit(&self, magnet: &MagnetReference) -> Result<JobId, DebridError>;

    /// Fetches the current status of a job.
    async fn status(&self, job: &JobId) -> Result<JobStatus, DebridError>;

    /// Exchanges a shared link for a direct download.
    async fn unlock(&self, link: &LinkEntry) -> Result<ResolvedDownload, DebridError>;
}
