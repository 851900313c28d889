//! Library folder operations.
//!
//! - [`Library`]: read-only view of the library folder used to gate
//!   descriptors whose content tag is already present.
//! - [`FileRouter`]: classifies finished downloads by extension, moves
//!   qualifying files into the library, deletes the rest, and archives
//!   processed descriptors.
//!
//! The library listing is read live on every check and never locked.

mod dedup;
mod error;
mod fs;
mod router;

pub use dedup::Library;
pub use error::LibraryError;
pub use fs::move_file;
pub use router::{Disposition, FileRouter, RoutedFile};
