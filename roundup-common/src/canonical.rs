use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, RoundupError};

/// Serializes `value` as canonical JSON: UTF-8, object keys sorted
/// lexicographically, no extraneous whitespace, arrays in input order.
///
/// `serde_json::Map` is backed by a `BTreeMap` as long as the
/// `preserve_order` feature is not enabled (it isn't, here), so object
/// keys are already sorted once a value round-trips through
/// `serde_json::Value` — we only need to ask for compact formatting.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let as_value = serde_json::to_value(value)
        .map_err(|e| RoundupError::Storage(format!("canonical-json serialize: {e}")))?;
    serde_json::to_string(&as_value)
        .map_err(|e| RoundupError::Storage(format!("canonical-json encode: {e}")))
}

/// Computes the SHA-256 digest of `data`, hex-encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes `sha256(canonical-json(value))`, per invariant 4.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String> {
    let json = canonical_json(value)?;
    Ok(sha256_hex(json.as_bytes()))
}
