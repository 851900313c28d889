//! Direct download of resolved links into the staging folder.
//!
//! A `Downloader` takes a `ResolvedDownload` (direct URL, filename, expected
//! size) and streams it to a file in the staging folder, reporting progress
//! at chunk granularity. Failures are per transfer and never affect sibling
//! downloads.

mod http;
mod progress;
mod types;

pub use http::HttpDownloader;
pub use progress::{ProgressSnapshot, TransferProgress};
pub use types::*;
