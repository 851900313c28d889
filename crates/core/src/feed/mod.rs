//! Remote descriptor feed.
//!
//! Periodically reads an HTML index protected by HTTP Basic auth and copies
//! matching descriptors into the watch folder, where the pipeline driver
//! picks them up.

mod fetcher;
mod index;

pub use fetcher::{FeedError, FeedFetcher};
pub use index::{parse_anchors, Anchor};
