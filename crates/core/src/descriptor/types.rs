//! Types for parsed descriptors.

use serde::Serialize;
use serde_bencode::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading a descriptor or deriving its magnet.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The file could not be read.
    #[error("Failed to read descriptor {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not valid bencoding.
    #[error("Malformed bencoding: {0}")]
    Decode(String),

    /// The top-level dictionary has no `info` key.
    #[error("Descriptor has no info dictionary")]
    MissingInfo,

    /// A value has the wrong bencode type.
    #[error("Invalid descriptor structure: {0}")]
    InvalidStructure(String),

    /// The info dictionary could not be re-encoded for hashing.
    #[error("Failed to re-encode info dictionary: {0}")]
    Encode(String),
}

/// A parsed torrent descriptor. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub(super) path: PathBuf,
    pub(super) name: String,
    pub(super) files: Option<Vec<Vec<String>>>,
    pub(super) info: HashMap<Vec<u8>, Value>,
}

impl Descriptor {
    /// Where the descriptor was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the descriptor itself (not the declared content name).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Declared name from the info dictionary.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path segments of each entry for multi-file descriptors.
    pub fn files(&self) -> Option<&[Vec<String>]> {
        self.files.as_deref()
    }

    pub fn is_multi_file(&self) -> bool {
        self.files.is_some()
    }

    /// The raw info dictionary the content hash is computed from.
    pub fn info(&self) -> &HashMap<Vec<u8>, Value> {
        &self.info
    }

    /// Content names: one per joined file path, or the single declared name.
    pub fn names(&self) -> Vec<String> {
        match &self.files {
            Some(files) => files.iter().map(|segments| segments.join("/")).collect(),
            None => vec![self.name.clone()],
        }
    }

    /// First content tag found across [`Descriptor::names`].
    pub fn content_tag(&self) -> Option<ContentTag> {
        super::tag::first_tag(self.names())
    }

    /// Magnet reference for this descriptor.
    pub fn magnet(&self) -> Result<MagnetReference, DescriptorError> {
        super::magnet::derive_magnet(self)
    }
}

/// A `[16-hex-digit ID][vN]` identifier embedded in a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentTag(String);

impl ContentTag {
    pub(super) fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring test against a file name.
    pub fn is_contained_in(&self, file_name: &str) -> bool {
        file_name
            .to_lowercase()
            .contains(&self.0.to_lowercase())
    }
}

impl fmt::Display for ContentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Magnet reference derived from a descriptor's info dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetReference {
    pub(super) info_hash: [u8; 20],
    pub(super) display_name: String,
}

impl MagnetReference {
    /// Raw SHA-1 digest of the bencoded info dictionary.
    pub fn info_hash(&self) -> &[u8; 20] {
        &self.info_hash
    }

    /// Base32 form of the info hash, as used in the URI.
    pub fn info_hash_base32(&self) -> String {
        data_encoding::BASE32.encode(&self.info_hash)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// `magnet:?xt=urn:btih:<BASE32>&dn=<name>`
    pub fn uri(&self) -> String {
        format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            self.info_hash_base32(),
            urlencoding::encode(&self.display_name)
        )
    }
}

impl fmt::Display for MagnetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}
