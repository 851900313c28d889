//! Resolution service (debrid) abstraction.
//!
//! A resolution service turns a magnet reference into direct download links:
//! the magnet is submitted as a remote job, the job is polled until it is
//! ready, and each resulting shared link is unlocked into a direct URL.
//!
//! This module provides the `ResolutionClient` trait, an AllDebrid HTTP
//! implementation, and the retry policy that governs job polling.

mod alldebrid;
mod poll;
mod retry;
mod types;

pub use alldebrid::AllDebridClient;
pub use poll::{poll_until_ready, PollOutcome};
pub use retry::{Backoff, RetryPolicy};
pub use types::*;
