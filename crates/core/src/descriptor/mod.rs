//! Torrent descriptor handling.
//!
//! A descriptor is a bencoded `.torrent` file dropped into the watch folder.
//! This module decodes it, extracts the content tag used for deduplication
//! and derives the magnet reference submitted to the resolution service.
//!
//! # Example
//!
//! ```ignore
//! use tinfetch_core::descriptor::parse_descriptor;
//!
//! let bytes = std::fs::read("watch/Game.torrent")?;
//! let descriptor = parse_descriptor("watch/Game.torrent", &bytes)?;
//!
//! if let Some(tag) = descriptor.content_tag() {
//!     println!("tag: {}", tag);
//! }
//! let magnet = descriptor.magnet()?;
//! println!("{}", magnet.uri());
//! ```

mod magnet;
mod parser;
mod tag;
mod types;

pub use magnet::derive_magnet;
pub use parser::parse_descriptor;
pub use tag::{extract_tag, first_tag};
pub use types::{ContentTag, Descriptor, DescriptorError, MagnetReference};
