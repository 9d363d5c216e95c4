//! Retention sweeper: evicts buckets older than the retention window.
//!
//! A sweep walks a snapshot of the metric names and locks one series at a
//! time. It is not atomic across metrics; an interrupted sweep is simply
//! completed by the next one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use counter_core::{timekey, MetricStore};

use crate::obs::metrics::ServerMetrics;

pub struct RetentionSweeper {
    store: Arc<MetricStore>,
    window: Duration,
    metrics: Arc<ServerMetrics>,
}

impl RetentionSweeper {
    pub fn new(store: Arc<MetricStore>, window: Duration, metrics: Arc<ServerMetrics>) -> Self {
        Self { store, window, metrics }
    }

    /// Sweep relative to `now`; returns the number of evicted buckets.
    pub fn sweep_at(&self, now: DateTime<Local>) -> usize {
        let cutoff = timekey::cutoff_key(&now, self.window);
        self.sweep_before(&cutoff)
    }

    /// Evict every bucket with key `< cutoff`.
    pub fn sweep_before(&self, cutoff: &str) -> usize {
        let mut total = 0;
        for (metric, keys) in self.store.evict_before(cutoff) {
            for key in &keys {
                tracing::debug!(metric = %metric, key = %key, "removing old datapoint");
            }
            total += keys.len();
        }
        self.metrics.buckets_evicted.add(&[], total as u64);
        if total > 0 {
            tracing::debug!(cutoff = %cutoff, removed = total, "retention sweep finished");
        }
        total
    }

    /// Sweep immediately, then every `interval` until `shutdown`.
    pub async fn run(self, interval: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_at(Local::now());
                }
            }
        }
        tracing::debug!("retention sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use counter_core::{Datapoint, RawSample};

    fn store_with(keys: &[&str]) -> Arc<MetricStore> {
        let store = Arc::new(MetricStore::new());
        for k in keys {
            store.apply(&RawSample::single("cpu", Datapoint::new(1.0, 1)), k);
        }
        store
    }

    #[test]
    fn sweep_keeps_only_window() {
        let store = store_with(&["2024-06-15 05:00", "2024-06-15 06:29", "2024-06-15 06:30", "2024-06-15 12:00"]);
        let metrics = Arc::new(ServerMetrics::default());
        let sweeper = RetentionSweeper::new(Arc::clone(&store), Duration::from_secs(6 * 3600), Arc::clone(&metrics));

        let naive = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap().and_hms_opt(12, 30, 0).unwrap();
        let now = Local.from_local_datetime(&naive).earliest().unwrap();

        assert_eq!(sweeper.sweep_at(now), 2);
        let left: Vec<String> = store.lookup("cpu").unwrap().snapshot().into_keys().collect();
        assert_eq!(left, vec!["2024-06-15 06:30", "2024-06-15 12:00"]);
        assert_eq!(metrics.buckets_evicted.get(&[]), 2);
    }

    #[test]
    fn repeated_sweep_is_a_no_op() {
        let store = store_with(&["2024-01-01 00:00", "2024-01-02 00:00"]);
        let sweeper = RetentionSweeper::new(Arc::clone(&store), Duration::from_secs(60), Arc::new(ServerMetrics::default()));
        assert_eq!(sweeper.sweep_before("2024-01-01 12:00"), 1);
        assert_eq!(sweeper.sweep_before("2024-01-01 12:00"), 0);
        assert_eq!(store.lookup("cpu").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let store = store_with(&["2000-01-01 00:00"]);
        let sweeper = RetentionSweeper::new(Arc::clone(&store), Duration::from_secs(3600), Arc::new(ServerMetrics::default()));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(sweeper.run(Duration::from_secs(300), shutdown.clone()));

        // first tick is immediate
        tokio::time::timeout(Duration::from_secs(5), async {
            while !store.lookup("cpu").unwrap().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        task.await.unwrap();
    }
}
