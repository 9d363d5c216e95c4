use serde::{Deserialize, Serialize};

use crate::error::{CounterError, Result};

/// One metric's aggregate for one minute.
///
/// `count` is always positive; the average is derived from `sum / count`
/// whenever it is read or serialized, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BucketRecord", into = "BucketRecord")]
pub struct Bucket {
    sum: f64,
    count: u64,
}

impl Bucket {
    /// First observation(s) for a minute. A zero count is one observation.
    pub fn new(value: f64, count: u64) -> Self {
        Self { sum: value, count: count.max(1) }
    }

    /// Like `new`, but refuses a non-finite sum.
    pub fn try_new(value: f64, count: u64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CounterError::Overflow(format!("value {value} is not finite")));
        }
        Ok(Self::new(value, count))
    }

    /// Fold more observations in. Leaves the bucket untouched and errors if
    /// the count would wrap or the sum would stop being finite.
    pub fn add(&mut self, value: f64, count: u64) -> Result<()> {
        let count = self
            .count
            .checked_add(count.max(1))
            .ok_or_else(|| CounterError::Overflow("count exceeds u64".into()))?;
        let sum = self.sum + value;
        if !sum.is_finite() {
            return Err(CounterError::Overflow(format!("sum {sum} is not finite")));
        }
        self.sum = sum;
        self.count = count;
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn average(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Wire/snapshot shape: `{"value": sum, "count": n, "average": sum/n}`.
#[derive(Debug, Serialize, Deserialize)]
struct BucketRecord {
    value: f64,
    count: u64,
    // recomputed on load
    #[serde(default)]
    average: f64,
}

impl From<Bucket> for BucketRecord {
    fn from(b: Bucket) -> Self {
        Self { value: b.sum, count: b.count, average: b.average() }
    }
}

impl TryFrom<BucketRecord> for Bucket {
    type Error = CounterError;

    fn try_from(r: BucketRecord) -> std::result::Result<Self, Self::Error> {
        if r.count == 0 {
            return Err(CounterError::Restore("bucket with zero count".into()));
        }
        Ok(Self { sum: r.value, count: r.count })
    }
}
