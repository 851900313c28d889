//! Watch-folder pipeline.
//!
//! Drives each descriptor found in the watch folder through its lifecycle:
//!
//! ```text
//! Discovered → Parsed → DedupChecked → MagnetDerived → Submitted → Polling
//!            → LinksResolved → Downloading → Archived
//! ```
//!
//! with early exits to `Skipped` (content already in the library, descriptor
//! deleted) or `Abandoned` (a stage failed, descriptor left in place for the
//! next scan).
//!
//! Descriptors are handled one at a time so remote submissions never overlap.
//! Within one descriptor the resolved links are downloaded concurrently and
//! joined before the descriptor is archived.

mod driver;
mod fanout;
mod types;

pub use driver::PipelineDriver;
pub use fanout::download_all;
pub use types::*;
