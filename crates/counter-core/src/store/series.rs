use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::bucket::Bucket;
use crate::error::Result;
use crate::sample::Datapoint;

/// Minute-key -> bucket. A `BTreeMap` keeps keys in chronological order.
pub type Buckets = BTreeMap<String, Bucket>;

/// One metric's buckets behind the series lock.
///
/// Callers reach a series through `MetricStore` and must not hold the store
/// lock while calling into it.
#[derive(Debug, Default)]
pub struct MetricSeries {
    buckets: Mutex<Buckets>,
}

impl MetricSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_buckets(buckets: Buckets) -> Self {
        Self { buckets: Mutex::new(buckets) }
    }

    /// Fold one datapoint into the bucket for `minute_key`. On overflow the
    /// series is left unchanged.
    pub fn apply(&self, minute_key: &str, point: Datapoint) -> Result<()> {
        let mut buckets = self.buckets.lock();
        match buckets.get_mut(minute_key) {
            Some(bucket) => bucket.add(point.value, point.effective_count()),
            None => {
                let bucket = Bucket::try_new(point.value, point.effective_count())?;
                buckets.insert(minute_key.to_string(), bucket);
                Ok(())
            }
        }
    }

    /// Drop every bucket with key `< cutoff`; returns the evicted keys.
    pub fn evict_before(&self, cutoff: &str) -> Vec<String> {
        let mut buckets = self.buckets.lock();
        let kept = buckets.split_off(cutoff);
        let evicted = std::mem::replace(&mut *buckets, kept);
        evicted.into_keys().collect()
    }

    /// Copy of the current buckets.
    pub fn snapshot(&self) -> Buckets {
        self.buckets.lock().clone()
    }

    /// Run `f` with the series locked (e.g. to serialize without a copy).
    pub fn with_buckets<R>(&self, f: impl FnOnce(&Buckets) -> R) -> R {
        f(&self.buckets.lock())
    }

    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(series: &MetricSeries) -> Vec<String> {
        series.snapshot().into_keys().collect()
    }

    #[test]
    fn apply_aggregates_same_minute() {
        let s = MetricSeries::new();
        s.apply("2024-01-01 10:00", Datapoint::new(4.0, 1)).unwrap();
        s.apply("2024-01-01 10:00", Datapoint::new(6.0, 1)).unwrap();
        s.apply("2024-01-01 10:01", Datapoint::new(1.0, 0)).unwrap();

        let snap = s.snapshot();
        let b = snap["2024-01-01 10:00"];
        assert_eq!((b.sum(), b.count(), b.average()), (10.0, 2, 5.0));
        assert_eq!(snap["2024-01-01 10:01"].count(), 1);
    }

    #[test]
    fn rejected_datapoint_keeps_previous_bucket() {
        let s = MetricSeries::new();
        s.apply("2024-01-01 10:00", Datapoint::new(1.0, u64::MAX)).unwrap();
        assert!(s.apply("2024-01-01 10:00", Datapoint::new(1.0, 1)).is_err());
        assert!(s.apply("2024-01-01 10:01", Datapoint::new(f64::INFINITY, 1)).is_err());

        let snap = s.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap["2024-01-01 10:00"].count(), u64::MAX);
    }

    #[test]
    fn evict_before_keeps_cutoff_and_newer() {
        let s = MetricSeries::new();
        for k in ["2024-01-01 03:59", "2024-01-01 04:00", "2024-01-01 04:01", "2023-12-31 23:00"] {
            s.apply(k, Datapoint::new(1.0, 1)).unwrap();
        }

        let evicted = s.evict_before("2024-01-01 04:00");
        assert_eq!(evicted, vec!["2023-12-31 23:00", "2024-01-01 03:59"]);
        assert_eq!(keys(&s), vec!["2024-01-01 04:00", "2024-01-01 04:01"]);
    }

    #[test]
    fn evicting_everything_leaves_empty_series() {
        let s = MetricSeries::new();
        s.apply("2024-01-01 00:00", Datapoint::new(1.0, 1)).unwrap();
        s.evict_before("2025-01-01 00:00");
        assert!(s.is_empty());
    }
}
