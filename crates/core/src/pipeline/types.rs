//! Types for the pipeline driver.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::debrid::{DebridError, JobId};
use crate::descriptor::{ContentTag, DescriptorError};
use crate::library::{Disposition, LibraryError};

/// Lifecycle state of one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorState {
    Discovered,
    Parsed,
    DedupChecked,
    MagnetDerived,
    Submitted,
    Polling,
    LinksResolved,
    Downloading,
    /// Moved to the complete folder.
    Archived,
    /// Content already in the library; descriptor deleted.
    Skipped,
    /// A stage failed; descriptor left in the watch folder.
    Abandoned,
}

impl DescriptorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Parsed => "parsed",
            Self::DedupChecked => "dedup_checked",
            Self::MagnetDerived => "magnet_derived",
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::LinksResolved => "links_resolved",
            Self::Downloading => "downloading",
            Self::Archived => "archived",
            Self::Skipped => "skipped",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived | Self::Skipped | Self::Abandoned)
    }
}

/// Why a descriptor was abandoned.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read descriptor {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed descriptor: {0}")]
    Parse(#[from] DescriptorError),

    #[error("Submission failed: {0}")]
    Submit(#[source] DebridError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

/// What happened to one link of a job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Downloaded and routed.
    Routed {
        link: String,
        filename: String,
        bytes: u64,
        disposition: Disposition,
        path: Option<PathBuf>,
    },
    /// The service refused to unlock the link.
    UnlockFailed { link: String, error: String },
    /// The transfer itself failed.
    TransferFailed {
        link: String,
        filename: String,
        error: String,
    },
    /// Downloaded, but moving or deleting the file failed.
    RouteFailed {
        link: String,
        filename: String,
        error: String,
    },
}

impl LinkOutcome {
    pub fn link(&self) -> &str {
        match self {
            Self::Routed { link, .. }
            | Self::UnlockFailed { link, .. }
            | Self::TransferFailed { link, .. }
            | Self::RouteFailed { link, .. } => link,
        }
    }

    pub fn disposition(&self) -> Option<Disposition> {
        match self {
            Self::Routed { disposition, .. } => Some(*disposition),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Routed { .. })
    }
}

/// Result of driving one descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorReport {
    /// File name of the descriptor in the watch folder.
    pub descriptor: String,
    pub tag: Option<ContentTag>,
    /// Library file that caused a skip.
    pub duplicate_of: Option<String>,
    pub job_id: Option<JobId>,
    /// Every state entered, in order; the last one is final.
    pub transitions: Vec<DescriptorState>,
    pub links: Vec<LinkOutcome>,
    pub error: Option<String>,
}

impl DescriptorReport {
    pub(super) fn new(descriptor: String) -> Self {
        Self {
            descriptor,
            tag: None,
            duplicate_of: None,
            job_id: None,
            transitions: vec![DescriptorState::Discovered],
            links: Vec::new(),
            error: None,
        }
    }

    pub(super) fn enter(&mut self, state: DescriptorState) {
        self.transitions.push(state);
    }

    pub(super) fn abandon(mut self, error: PipelineError) -> Self {
        self.error = Some(error.to_string());
        self.enter(DescriptorState::Abandoned);
        self
    }

    /// Final state.
    pub fn state(&self) -> DescriptorState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(DescriptorState::Discovered)
    }

    pub fn reached(&self, state: DescriptorState) -> bool {
        self.transitions.contains(&state)
    }
}
