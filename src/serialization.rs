//! Versioned storage envelope.
//!
//! Every value written to a [`StorageBackend`](crate::backend::StorageBackend) is wrapped as
//!
//! ```text
//! [MAGIC: 4 bytes] [VERSION: u32 little-endian] [JSON PAYLOAD]
//! ```
//!
//! so that foreign or outdated bytes are rejected before the payload is decoded.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Magic header identifying bytes written by this crate.
pub const MAGIC: &[u8; 4] = b"NRKT";

/// Bump whenever the stored shape of [`CacheEntry`](crate::entry::CacheEntry) changes.
pub const SCHEMA_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// Encode `value` into an envelope.
pub fn serialize_for_store<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let payload =
        serde_json::to_vec(value).map_err(|e| Error::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode an envelope written by [`serialize_for_store`].
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: too short or wrong magic
/// - `Error::VersionMismatch`: written by another schema version
/// - `Error::DeserializationError`: payload does not decode as `T`
pub fn deserialize_from_store<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidCacheEntry(format!(
            "envelope too short ({} bytes)",
            bytes.len()
        )));
    }

    let (magic, rest) = bytes.split_at(4);
    if magic != MAGIC {
        return Err(Error::InvalidCacheEntry("bad magic header".to_string()));
    }

    let (version, payload) = rest.split_at(4);
    let mut raw = [0u8; 4];
    raw.copy_from_slice(version);
    let found = u32::from_le_bytes(raw);
    if found != SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        });
    }

    serde_json::from_slice(payload).map_err(|e| Error::DeserializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_envelope_header() {
        let bytes = serialize_for_store(&"hello").unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(&bytes[4..8], &SCHEMA_VERSION.to_le_bytes());
        assert_eq!(&bytes[8..], b"\"hello\"");
    }

    #[test]
    fn test_string_map_survives_envelope() {
        let mut map = BTreeMap::new();
        map.insert("NEWS_API_KEY".to_string(), "abc".to_string());
        let bytes = serialize_for_store(&map).unwrap();
        let back: BTreeMap<String, String> = deserialize_from_store(&bytes).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = serialize_for_store(&1u32).unwrap();
        bytes[0] = b'X';
        let err = deserialize_from_store::<u32>(&bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidCacheEntry(_)));
    }

    #[test]
    fn test_rejects_short_input() {
        let err = deserialize_from_store::<u32>(b"NRK").unwrap_err();
        assert!(matches!(err, Error::InvalidCacheEntry(_)));
    }

    #[test]
    fn test_rejects_other_version() {
        let mut bytes = serialize_for_store(&1u32).unwrap();
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        let err = deserialize_from_store::<u32>(&bytes).unwrap_err();
        assert_eq!(
            err,
            Error::VersionMismatch {
                expected: SCHEMA_VERSION,
                found: 99
            }
        );
    }

    #[test]
    fn test_rejects_wrong_payload_type() {
        let bytes = serialize_for_store(&"text").unwrap();
        let err = deserialize_from_store::<u64>(&bytes).unwrap_err();
        assert!(matches!(err, Error::DeserializationError(_)));
    }
}
