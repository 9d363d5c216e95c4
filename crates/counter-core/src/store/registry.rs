use std::sync::Arc;

use dashmap::DashMap;

use super::series::{Buckets, MetricSeries};
use crate::error::CounterError;
use crate::sample::RawSample;

/// Outcome of folding one sample into the store.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: usize,
    /// Datapoints refused because their bucket would overflow.
    pub rejected: Vec<(String, CounterError)>,
}

/// Metric registry: `name -> series`.
///
/// The map's shard locks only cover insert/lookup. Every accessor clones the
/// `Arc` out and releases the map before the series lock is taken, so bucket
/// work on one metric never blocks another and no caller ever holds a series
/// lock while touching the map.
#[derive(Debug, Default)]
pub struct MetricStore {
    series: DashMap<String, Arc<MetricSeries>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self { series: DashMap::new() }
    }

    /// Existing series, never creates.
    pub fn lookup(&self, name: &str) -> Option<Arc<MetricSeries>> {
        self.series.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Existing series, or a new empty one. Racing callers on an unseen name
    /// all observe the same series: creation happens under the entry's shard lock.
    pub fn get_or_create(&self, name: &str) -> Arc<MetricSeries> {
        if let Some(s) = self.lookup(name) {
            return s;
        }
        let entry = self
            .series
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MetricSeries::new()));
        Arc::clone(entry.value())
    }

    /// Install a restored series, replacing any previous entry.
    pub fn install(&self, name: impl Into<String>, buckets: Buckets) {
        self.series.insert(name.into(), Arc::new(MetricSeries::from_buckets(buckets)));
    }

    /// Current metric names, sorted.
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.series.iter().map(|r| r.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Fold every datapoint of `sample` into the bucket for `minute_key`.
    /// A datapoint that would overflow its bucket is skipped; the others in
    /// the sample still land.
    pub fn apply(&self, sample: &RawSample, minute_key: &str) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (name, point) in sample.iter() {
            match self.get_or_create(name).apply(minute_key, *point) {
                Ok(()) => report.applied += 1,
                Err(e) => report.rejected.push((name.to_string(), e)),
            }
        }
        report
    }

    /// Evict buckets older than `cutoff` from every series; returns
    /// `(metric, evicted keys)` for series that lost at least one bucket.
    pub fn evict_before(&self, cutoff: &str) -> Vec<(String, Vec<String>)> {
        self.list_names()
            .into_iter()
            .filter_map(|name| {
                let series = self.lookup(&name)?;
                let evicted = series.evict_before(cutoff);
                (!evicted.is_empty()).then_some((name, evicted))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Datapoint;
    use std::thread;

    const KEY: &str = "2024-01-01 10:00";

    #[test]
    fn lookup_never_creates() {
        let store = MetricStore::new();
        assert!(store.lookup("requests").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn aggregation_matches_sums() {
        let store = MetricStore::new();
        let points = [(1.5, 1), (2.5, 3), (6.0, 0), (10.0, 2)];
        for (v, c) in points {
            store.apply(&RawSample::single("latency", Datapoint::new(v, c)), KEY);
        }

        let b = store.lookup("latency").unwrap().snapshot()[KEY];
        assert_eq!(b.sum(), 20.0);
        assert_eq!(b.count(), 7);
        assert_eq!(b.average(), 20.0 / 7.0);
    }

    #[test]
    fn overflowing_datapoint_does_not_block_siblings() {
        let store = MetricStore::new();
        store.apply(&RawSample::single("big", Datapoint::new(1e308, 1)), KEY);

        let body = br#"{"big": {"value": 1e308}, "small": {"value": 2.0}}"#;
        let sample = RawSample::from_json(body).unwrap();
        let report = store.apply(&sample, KEY);

        assert_eq!(report.applied, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, "big");
        assert_eq!(store.lookup("big").unwrap().snapshot()[KEY].sum(), 1e308);
        assert_eq!(store.lookup("small").unwrap().snapshot()[KEY].sum(), 2.0);
    }

    #[test]
    fn concurrent_first_writes_create_one_series() {
        let store = Arc::new(MetricStore::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let s = store.get_or_create("fresh");
                    s.apply(KEY, Datapoint::new(1.0, 1)).unwrap();
                    s
                })
            })
            .collect();
        let seen: Vec<Arc<MetricSeries>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(store.len(), 1);
        let canonical = store.lookup("fresh").unwrap();
        assert!(seen.iter().all(|s| Arc::ptr_eq(s, &canonical)));
        assert_eq!(canonical.snapshot()[KEY].count(), 16);
    }

    #[test]
    fn list_names_is_sorted() {
        let store = MetricStore::new();
        for n in ["zeta", "alpha", "m.x", "beta-2", "beta"] {
            store.get_or_create(n);
        }
        assert_eq!(store.list_names(), vec!["alpha", "beta", "beta-2", "m.x", "zeta"]);
    }

    #[test]
    fn evict_before_spans_metrics_and_keeps_empty_series() {
        let store = MetricStore::new();
        store.apply(&RawSample::single("a", Datapoint::new(1.0, 1)), "2024-01-01 01:00");
        store.apply(&RawSample::single("a", Datapoint::new(1.0, 1)), "2024-01-01 08:00");
        store.apply(&RawSample::single("b", Datapoint::new(1.0, 1)), "2024-01-01 02:00");

        let evicted = store.evict_before("2024-01-01 06:00");
        assert_eq!(evicted.len(), 2);
        assert_eq!(store.lookup("a").unwrap().len(), 1);
        assert!(store.lookup("b").unwrap().is_empty());
        assert_eq!(store.list_names(), vec!["a", "b"]);
    }

    #[test]
    fn install_replaces_series() {
        let store = MetricStore::new();
        store.get_or_create("requests");
        let mut buckets = Buckets::new();
        buckets.insert(KEY.to_string(), crate::store::Bucket::new(20.0, 4));
        store.install("requests", buckets.clone());
        assert_eq!(store.lookup("requests").unwrap().snapshot(), buckets);
    }
}
