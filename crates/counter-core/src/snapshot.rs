//! Snapshot codec: one metric's buckets <-> the bytes of `<metric>.json`.
//!
//! The on-disk form is the same JSON object served by `GET /metric/{name}`:
//! `{"2024-01-01 10:00": {"value": 20.0, "count": 4, "average": 5.0}, ...}`.

use std::collections::BTreeMap;

use crate::error::{CounterError, Result};
use crate::name;
use crate::store::{Bucket, Buckets};
use crate::timekey;

pub const FILE_EXT: &str = "json";

/// Snapshot file name for a metric.
pub fn file_name(metric: &str) -> String {
    format!("{metric}.{FILE_EXT}")
}

/// Metric name encoded in a snapshot file name, if the name is one.
pub fn metric_from_file_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(FILE_EXT)?.strip_suffix('.')?;
    name::is_valid(stem).then_some(stem)
}

pub fn encode(buckets: &Buckets) -> Result<Vec<u8>> {
    serde_json::to_vec(buckets).map_err(|e| CounterError::Persistence(format!("encode failed: {e}")))
}

/// Decode a snapshot. The document must be a JSON object; individual entries
/// with a malformed key or an invalid bucket are dropped with a warning.
pub fn decode(bytes: &[u8]) -> Result<Buckets> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes)
        .map_err(|e| CounterError::Restore(format!("invalid snapshot: {e}")))?;

    let mut buckets = Buckets::new();
    for (key, value) in raw {
        if timekey::parse(&key).is_none() {
            tracing::warn!(key = %key, "snapshot entry has malformed minute key, skipped");
            continue;
        }
        match serde_json::from_value::<Bucket>(value) {
            Ok(bucket) => {
                buckets.insert(key, bucket);
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "snapshot entry skipped"),
        }
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_map_back_to_metrics() {
        assert_eq!(file_name("api.hits"), "api.hits.json");
        assert_eq!(metric_from_file_name("api.hits.json"), Some("api.hits"));
        assert_eq!(metric_from_file_name("api.hits.json.tmp"), None);
        assert_eq!(metric_from_file_name("README"), None);
        assert_eq!(metric_from_file_name(".json"), None);
        assert_eq!(metric_from_file_name("Upper.json"), None);
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let mut buckets = Buckets::new();
        buckets.insert("2024-01-01 10:00".into(), Bucket::new(20.0, 4));
        buckets.insert("2024-01-01 10:01".into(), Bucket::new(0.1, 3));
        let bytes = encode(&buckets).unwrap();
        assert_eq!(decode(&bytes).unwrap(), buckets);
    }

    #[test]
    fn non_object_is_an_error() {
        assert!(matches!(decode(b"[1,2]"), Err(CounterError::Restore(_))));
        assert!(decode(b"").is_err());
    }
}
