//! Raw ingestion input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CounterError, Result};
use crate::name;

/// A partial datapoint as written by clients: `{"value": 4.5, "count": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub value: f64,
    #[serde(default)]
    pub count: u64,
}

impl Datapoint {
    pub fn new(value: f64, count: u64) -> Self {
        Self { value, count }
    }

    /// Weight this datapoint contributes; an absent or zero count is one observation.
    pub fn effective_count(&self) -> u64 {
        self.count.max(1)
    }
}

/// One POST body: metric name -> datapoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSample(pub HashMap<String, Datapoint>);

impl RawSample {
    /// Decode a write body and check every metric name.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let sample: RawSample = serde_json::from_slice(body)
            .map_err(|e| CounterError::BadRequest(format!("invalid sample: {e}")))?;
        for metric in sample.0.keys() {
            name::validate(metric)?;
        }
        Ok(sample)
    }

    pub fn single(metric: impl Into<String>, point: Datapoint) -> Self {
        let mut map = HashMap::with_capacity(1);
        map.insert(metric.into(), point);
        Self(map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Datapoint)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
