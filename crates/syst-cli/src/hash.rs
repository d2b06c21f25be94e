use serde::Serialize;
use sha2::{Digest, Sha256};
use syst_core::SystError;
use syst_table::serde::to_canonical_json_bytes;

/// SHA-256 of the canonical JSON encoding of `value`.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, SystError> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(bytes_hash(&bytes))
}

/// SHA-256 of raw bytes, hex encoded.
pub fn bytes_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
