//! Read-side operations over the store, shared by HTTP handlers.

use counter_core::error::{CounterError, Result};
use counter_core::store::Buckets;
use counter_core::{name, MetricStore};

use crate::chart::{self, Dimension, Point};

/// Sorted metric names.
pub fn list_metrics(store: &MetricStore) -> Vec<String> {
    store.list_names()
}

/// Copy of a metric's buckets. Names outside the metric alphabet are never
/// stored, so they are reported as not found.
pub fn get_series(store: &MetricStore, metric: &str) -> Result<Buckets> {
    if !name::is_valid(metric) {
        return Err(CounterError::NotFound);
    }
    store
        .lookup(metric)
        .map(|series| series.snapshot())
        .ok_or(CounterError::NotFound)
}

/// Chronological points of one dimension, ready for a renderer.
pub fn chart_points(store: &MetricStore, metric: &str, dimension: Dimension) -> Result<Vec<Point>> {
    let buckets = get_series(store, metric)?;
    Ok(chart::series_points(&buckets, dimension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_core::{Datapoint, RawSample};

    #[test]
    fn unknown_and_invalid_names_are_not_found() {
        let store = MetricStore::new();
        assert!(matches!(get_series(&store, "missing"), Err(CounterError::NotFound)));
        assert!(matches!(get_series(&store, "../x"), Err(CounterError::NotFound)));
        assert!(matches!(chart_points(&store, "missing", Dimension::Sum), Err(CounterError::NotFound)));
    }

    #[test]
    fn series_is_a_copy() {
        let store = MetricStore::new();
        store.apply(&RawSample::single("a", Datapoint::new(1.0, 1)), "2024-01-01 10:00");
        let copy = get_series(&store, "a").unwrap();
        store.apply(&RawSample::single("a", Datapoint::new(1.0, 1)), "2024-01-01 10:00");
        assert_eq!(copy["2024-01-01 10:00"].count(), 1);
        assert_eq!(list_metrics(&store), vec!["a"]);
    }
}
