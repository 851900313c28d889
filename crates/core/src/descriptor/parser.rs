//! Descriptor parser - decodes bencoded `.torrent` data.
//!
//! Only the parts of the metainfo the pipeline needs are interpreted (the
//! declared name and the multi-file listing). The whole `info` dictionary is
//! kept so the content hash covers every key, known or not.

use serde_bencode::value::Value;
use std::path::PathBuf;

use super::types::{Descriptor, DescriptorError};

/// Parse raw descriptor bytes read from `path`.
///
/// Supports both single-file and multi-file descriptors. Multi-file entries
/// whose `path` is missing or not a list of byte strings are skipped.
pub fn parse_descriptor(
    path: impl Into<PathBuf>,
    bytes: &[u8],
) -> Result<Descriptor, DescriptorError> {
    let root: Value =
        serde_bencode::from_bytes(bytes).map_err(|e| DescriptorError::Decode(e.to_string()))?;

    let Value::Dict(mut root) = root else {
        return Err(DescriptorError::InvalidStructure(
            "top-level value is not a dictionary".to_string(),
        ));
    };

    let info = match root.remove(b"info".as_slice()) {
        Some(Value::Dict(info)) => info,
        Some(_) => {
            return Err(DescriptorError::InvalidStructure(
                "info is not a dictionary".to_string(),
            ))
        }
        None => return Err(DescriptorError::MissingInfo),
    };

    let name = match info.get(b"name".as_slice()) {
        Some(Value::Bytes(b)) => bytes_to_string(b),
        _ => String::new(),
    };

    let files = match info.get(b"files".as_slice()) {
        Some(Value::List(entries)) => Some(entries.iter().filter_map(file_segments).collect()),
        _ => None,
    };

    Ok(Descriptor {
        path: path.into(),
        name,
        files,
        info,
    })
}

/// Path segments of one `files` entry.
fn file_segments(entry: &Value) -> Option<Vec<String>> {
    let Value::Dict(entry) = entry else {
        return None;
    };
    let Some(Value::List(parts)) = entry.get(b"path".as_slice()) else {
        return None;
    };

    parts
        .iter()
        .map(|part| match part {
            Value::Bytes(b) => Some(bytes_to_string(b)),
            _ => None,
        })
        .collect()
}

/// Convert bytes to a UTF-8 string, replacing invalid sequences.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_parse_single_file() {
        let bytes = fixtures::single_file_descriptor("Game [0100ABCDEF123456][v0].nsp", 1024);
        let descriptor = parse_descriptor("watch/game.torrent", &bytes).unwrap();

        assert_eq!(descriptor.name(), "Game [0100ABCDEF123456][v0].nsp");
        assert!(!descriptor.is_multi_file());
        assert_eq!(descriptor.names(), vec!["Game [0100ABCDEF123456][v0].nsp"]);
        assert_eq!(descriptor.file_name(), "game.torrent");
        assert!(descriptor.info().contains_key(b"piece length".as_slice()));
    }

    #[test]
    fn test_parse_multi_file() {
        let bytes = fixtures::multi_file_descriptor(
            "Bundle",
            &[
                &["base", "Game [0100ABCDEF123456][v0].nsp"],
                &["update", "Game [0100ABCDEF123800][v65536].nsp"],
            ],
        );
        let descriptor = parse_descriptor("bundle.torrent", &bytes).unwrap();

        assert!(descriptor.is_multi_file());
        assert_eq!(descriptor.files().unwrap().len(), 2);
        assert_eq!(
            descriptor.names(),
            vec![
                "base/Game [0100ABCDEF123456][v0].nsp",
                "update/Game [0100ABCDEF123800][v65536].nsp",
            ]
        );
    }

    #[test]
    fn test_parse_invalid_bencoding() {
        let result = parse_descriptor("x.torrent", b"not a valid torrent");
        assert!(matches!(result, Err(DescriptorError::Decode(_))));
    }

    #[test]
    fn test_parse_empty_data() {
        let result = parse_descriptor("x.torrent", b"");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_missing_info() {
        let result = parse_descriptor("x.torrent", b"d8:announce3:urle");
        assert!(matches!(result, Err(DescriptorError::MissingInfo)));
    }

    #[test]
    fn test_parse_info_not_a_dict() {
        let result = parse_descriptor("x.torrent", b"d4:infoi42ee");
        assert!(matches!(result, Err(DescriptorError::InvalidStructure(_))));
    }

    #[test]
    fn test_parse_top_level_list() {
        let result = parse_descriptor("x.torrent", b"l4:infoe");
        assert!(matches!(result, Err(DescriptorError::InvalidStructure(_))));
    }

    #[test]
    fn test_invalid_utf8_name_is_lossy() {
        // d4:infod4:name7:<ff fe>helloee
        let mut bytes = b"d4:infod4:name7:".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"helloee");

        let descriptor = parse_descriptor("x.torrent", &bytes).unwrap();
        assert!(descriptor.name().contains("hello"));
    }

    #[test]
    fn test_multi_file_entry_without_path_is_skipped() {
        let bytes = b"d4:infod5:filesld6:lengthi1eed6:lengthi2e4:pathl1:aeee4:name1:xee";
        let descriptor = parse_descriptor("x.torrent", bytes).unwrap();
        assert_eq!(descriptor.names(), vec!["a"]);
    }
}
