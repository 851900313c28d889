//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the resolution service and
//! downloader traits, so the pipeline can be exercised end to end without a
//! network.
//!
//! # Example
//!
//! ```rust,ignore
//! use tinfetch_core::testing::{MockDownloader, MockResolutionClient};
//! use tinfetch_core::debrid::{JobId, JobStatus, LinkEntry};
//!
//! let resolver = MockResolutionClient::new();
//! resolver
//!     .set_default_status(JobStatus::ready(vec![LinkEntry::new("https://share/1")]))
//!     .await;
//!
//! let downloader = MockDownloader::new();
//! downloader.fail_on("broken.nsp", "connection reset").await;
//! ```

mod mock_downloader;
mod mock_resolver;

pub use mock_downloader::MockDownloader;
pub use mock_resolver::MockResolutionClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_bencode::value::Value;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use crate::debrid::LinkEntry;

    const PIECE_LENGTH: i64 = 262_144;

    fn bytes(s: &str) -> Value {
        Value::Bytes(s.as_bytes().to_vec())
    }

    fn base_info(name: &str) -> HashMap<Vec<u8>, Value> {
        let mut info = HashMap::new();
        info.insert(b"name".to_vec(), bytes(name));
        info.insert(b"piece length".to_vec(), Value::Int(PIECE_LENGTH));
        info.insert(b"pieces".to_vec(), Value::Bytes(vec![0xAB; 20]));
        info
    }

    fn wrap(info: HashMap<Vec<u8>, Value>) -> Vec<u8> {
        let mut root = HashMap::new();
        root.insert(
            b"announce".to_vec(),
            bytes("http://tracker.example.org/announce"),
        );
        root.insert(b"info".to_vec(), Value::Dict(info));
        serde_bencode::to_bytes(&Value::Dict(root)).unwrap()
    }

    /// Bencoded single-file descriptor.
    pub fn single_file_descriptor(name: &str, length: i64) -> Vec<u8> {
        let mut info = base_info(name);
        info.insert(b"length".to_vec(), Value::Int(length));
        wrap(info)
    }

    /// Bencoded multi-file descriptor; each entry is a list of path segments.
    pub fn multi_file_descriptor(name: &str, files: &[&[&str]]) -> Vec<u8> {
        let mut info = base_info(name);
        let entries = files
            .iter()
            .map(|segments| {
                let mut entry = HashMap::new();
                entry.insert(b"length".to_vec(), Value::Int(1024));
                entry.insert(
                    b"path".to_vec(),
                    Value::List(segments.iter().map(|s| bytes(s)).collect()),
                );
                Value::Dict(entry)
            })
            .collect();
        info.insert(b"files".to_vec(), Value::List(entries));
        wrap(info)
    }

    /// Writes `data` as `dir/file_name` and returns the path.
    pub fn write_file(dir: &Path, file_name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Link entry with a filename hint.
    pub fn link_entry(filename: &str) -> LinkEntry {
        LinkEntry {
            link: format!("https://share.example.org/{}", filename.replace(' ', "_")),
            filename: Some(filename.to_string()),
            size: Some(1024),
        }
    }
}
