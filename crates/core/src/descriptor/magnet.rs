//! Magnet reference derivation.

use serde_bencode::value::Value;
use sha1::{Digest, Sha1};

use super::types::{Descriptor, DescriptorError, MagnetReference};

/// Derive the magnet reference of a descriptor.
///
/// The info hash is the SHA-1 of the canonical bencoding of the info
/// dictionary. Dictionary keys are re-sorted by the encoder, so a descriptor
/// written with unsorted keys still hashes the way trackers expect.
pub fn derive_magnet(descriptor: &Descriptor) -> Result<MagnetReference, DescriptorError> {
    let info = Value::Dict(descriptor.info().clone());
    let encoded =
        serde_bencode::to_bytes(&info).map_err(|e| DescriptorError::Encode(e.to_string()))?;

    let mut hasher = Sha1::new();
    hasher.update(&encoded);

    Ok(MagnetReference {
        info_hash: hasher.finalize().into(),
        display_name: descriptor.name().to_string(),
    })
}
