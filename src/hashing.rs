//! Hashing - Report Fingerprints
//!
//! SHA-256 over canonical JSON, so automation can compare runs without
//! diffing report text.

use serde::Serialize;
use serde_json::{to_string, Map, Value};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    to_string(&sort_value(v))
}

fn sort_value(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, sort_value(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(sort_value).collect()),
        other => other,
    }
}

/// Fingerprint of any serializable report: sha256(canonical_json(report))
pub fn report_fingerprint<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(report)?;
    Ok(sha256_hex(canonical.as_bytes()))
}
