//! Binary persistence for center sets.
//!
//! File layout: a CBOR wrapper (schema version, payload checksum,
//! payload bytes) compressed with zstd. The payload is the CBOR of the
//! [`CenterSet`] itself. Loads fail closed on any mismatch.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::CenterSet;

/// Current on-disk schema version.
const SET_SCHEMA_VERSION: u32 = 1;

/// Errors from center-set persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSet {
    schema_version: u32,
    sha256: String,
    payload: Vec<u8>,
}

/// Writes a center set to `path`.
pub fn save_center_set(path: impl AsRef<Path>, set: &CenterSet) -> Result<(), StoreError> {
    let payload = cbor_serialize(set)?;
    let stored = StoredSet {
        schema_version: SET_SCHEMA_VERSION,
        sha256: sha256_hex(&payload),
        payload,
    };
    let bytes = zstd_compress(&cbor_serialize(&stored)?)?;
    std::fs::write(path.as_ref(), &bytes)?;
    tracing::debug!(
        path = %path.as_ref().display(),
        splats = set.len(),
        bytes = bytes.len(),
        "center set saved"
    );
    Ok(())
}

/// Reads a center set back, verifying schema and checksum.
pub fn load_center_set(path: impl AsRef<Path>) -> Result<CenterSet, StoreError> {
    let compressed = std::fs::read(path.as_ref())?;
    let stored: StoredSet = cbor_deserialize(&zstd_decompress(&compressed)?)?;

    if stored.schema_version != SET_SCHEMA_VERSION {
        return Err(StoreError::SchemaMismatch {
            file_version: stored.schema_version,
            expected_version: SET_SCHEMA_VERSION,
        });
    }
    let actual = sha256_hex(&stored.payload);
    if actual != stored.sha256 {
        return Err(StoreError::IntegrityMismatch {
            expected: stored.sha256,
            actual,
        });
    }

    cbor_deserialize(&stored.payload)
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
