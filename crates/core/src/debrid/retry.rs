//! Retry policy for job status polling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Delay multiplied by `multiplier` after each attempt, capped at `max_interval_ms`.
    Exponential,
}

/// How often and how long a remote job is polled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay after the first attempt (milliseconds).
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Attempts before the job is abandoned.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub backoff: Backoff,

    /// Exponential backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound for exponential delays (milliseconds).
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,
}

fn default_interval() -> u64 {
    5000 // 5 seconds
}

fn default_max_attempts() -> u32 {
    60
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_interval() -> u64 {
    60_000 // 1 minute
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            max_attempts: default_max_attempts(),
            backoff: Backoff::default(),
            multiplier: default_multiplier(),
            max_interval_ms: default_max_interval(),
        }
    }
}

impl RetryPolicy {
    /// Fixed-interval policy.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts,
            ..Self::default()
        }
    }

    /// Switches to exponential backoff.
    pub fn with_exponential_backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.backoff = Backoff::Exponential;
        self.multiplier = multiplier;
        self.max_interval_ms = max_interval.as_millis() as u64;
        self
    }

    /// Delay to wait after the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => Duration::from_millis(self.interval_ms),
            Backoff::Exponential => {
                let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
                let millis = (self.interval_ms as f64 * factor).min(self.max_interval_ms as f64);
                Duration::from_millis(millis as u64)
            }
        }
    }

    /// Sum of every delay if all attempts are used.
    pub fn total_budget(&self) -> Duration {
        (0..self.max_attempts).map(|a| self.delay_for(a)).sum()
    }
}
