//! Transfer progress accounting.

use std::time::Duration;
use tokio::time::Instant;

/// Elapsed time is clamped to this before any rate math.
const MIN_ELAPSED_SECS: f64 = 0.1;
/// Added to the throughput so the ETA stays finite.
const ETA_EPSILON: f64 = 0.1;

const MIB: f64 = 1024.0 * 1024.0;

/// Running byte count for one transfer.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    expected: u64,
    downloaded: u64,
    started: Instant,
}

/// Derived figures at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub downloaded: u64,
    pub expected: u64,
    pub elapsed_secs: f64,
    /// Bytes per second.
    pub throughput: f64,
    /// Seconds until `expected` is reached at the current rate.
    pub eta_secs: f64,
    pub percent: f64,
}

impl ProgressSnapshot {
    pub fn throughput_mib(&self) -> f64 {
        self.throughput / MIB
    }

    pub fn downloaded_mib(&self) -> f64 {
        self.downloaded as f64 / MIB
    }
}

impl TransferProgress {
    /// Starts the clock. An `expected` of 0 is treated as 1.
    pub fn start(expected: u64) -> Self {
        Self {
            expected: expected.max(1),
            downloaded: 0,
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, bytes: usize) {
        self.downloaded += bytes as u64;
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(self.elapsed())
    }

    /// Computes the figures as if `elapsed` had passed since the start.
    pub fn snapshot_at(&self, elapsed: Duration) -> ProgressSnapshot {
        let elapsed_secs = elapsed.as_secs_f64().max(MIN_ELAPSED_SECS);
        let throughput = self.downloaded as f64 / elapsed_secs;
        let remaining = self.expected.saturating_sub(self.downloaded) as f64;

        ProgressSnapshot {
            downloaded: self.downloaded,
            expected: self.expected,
            elapsed_secs,
            throughput,
            eta_secs: remaining / (throughput + ETA_EPSILON),
            percent: self.downloaded as f64 / self.expected as f64 * 100.0,
        }
    }
}
