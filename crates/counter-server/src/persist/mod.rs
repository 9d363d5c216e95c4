//! Persistence manager: periodic per-metric snapshots and startup restore.
//!
//! Each metric lives in `<data_dir>/<metric>.json`. A snapshot is encoded
//! while holding only that metric's series lock, then written to a `.tmp`
//! sibling and renamed over the live file, so a crash mid-write never
//! replaces a good snapshot with a torn one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use counter_core::error::{CounterError, Result};
use counter_core::{snapshot, MetricStore};

use crate::obs::metrics::ServerMetrics;

/// Outcome of one `snapshot_all` pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotReport {
    pub written: usize,
    pub failed: usize,
}

/// Outcome of `restore_all`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: usize,
}

pub struct PersistenceManager {
    store: Arc<MetricStore>,
    data_dir: PathBuf,
    metrics: Arc<ServerMetrics>,
    // serializes whole passes (periodic vs final flush)
    pass: Mutex<()>,
}

impl PersistenceManager {
    pub fn new(store: Arc<MetricStore>, data_dir: impl Into<PathBuf>, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
            metrics,
            pass: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn snapshot_path(&self, metric: &str) -> PathBuf {
        self.data_dir.join(snapshot::file_name(metric))
    }

    /// Write every metric's snapshot. Per-metric failures are logged and
    /// counted; they never stop the pass.
    pub async fn snapshot_all(&self) -> SnapshotReport {
        let _pass = self.pass.lock().await;
        let mut report = SnapshotReport::default();

        if let Err(e) = tokio::fs::create_dir_all(&self.data_dir).await {
            tracing::warn!(dir = %self.data_dir.display(), error = %e, "cannot create data directory, snapshot skipped");
            return report;
        }

        for metric in self.store.list_names() {
            let Some(series) = self.store.lookup(&metric) else { continue };
            let res = match series.with_buckets(snapshot::encode) {
                Ok(bytes) => self.write_snapshot(&metric, &bytes).await,
                Err(e) => Err(e),
            };
            match res {
                Ok(()) => {
                    report.written += 1;
                    self.metrics.snapshot_writes.inc(&[("result", "ok")]);
                    tracing::debug!(metric = %metric, "persisted to disk");
                }
                Err(e) => {
                    report.failed += 1;
                    self.metrics.snapshot_writes.inc(&[("result", "error")]);
                    tracing::warn!(metric = %metric, error = %e, "could not write snapshot");
                }
            }
        }
        report
    }

    async fn write_snapshot(&self, metric: &str, bytes: &[u8]) -> Result<()> {
        let path = self.snapshot_path(metric);
        let tmp = self.data_dir.join(format!("{}.tmp", snapshot::file_name(metric)));
        let io = |e: std::io::Error| CounterError::Persistence(format!("{}: {e}", path.display()));

        tokio::fs::write(&tmp, bytes).await.map_err(io)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        Ok(())
    }

    /// Load every `<metric>.json` in the data directory into the store.
    /// Must run before the consumer starts and before HTTP traffic is served.
    pub async fn restore_all(&self) -> RestoreReport {
        let mut report = RestoreReport::default();

        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(dir = %self.data_dir.display(), "data directory not found, restore skipped");
                return report;
            }
            Err(e) => {
                tracing::warn!(dir = %self.data_dir.display(), error = %e, "data directory could not be read, restore skipped");
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "data directory listing failed, restore stopped early");
                    break;
                }
            };

            let file_name = entry.file_name();
            let Some(metric) = file_name.to_str().and_then(snapshot::metric_from_file_name) else {
                tracing::debug!(file = ?file_name, "not a snapshot file, ignored");
                continue;
            };

            match self.restore_file(&entry.path()).await {
                Ok(buckets) => {
                    tracing::debug!(metric = %metric, buckets = buckets.len(), "restored from disk");
                    self.store.install(metric, buckets);
                    report.restored += 1;
                    self.metrics.restore_files.inc(&[("result", "ok")]);
                }
                Err(e) => {
                    tracing::warn!(metric = %metric, error = %e, "snapshot skipped");
                    report.skipped += 1;
                    self.metrics.restore_files.inc(&[("result", "skipped")]);
                }
            }
        }

        self.metrics.metrics_tracked.set(self.store.len() as i64);
        tracing::info!(restored = report.restored, skipped = report.skipped, "restore finished");
        report
    }

    async fn restore_file(&self, path: &Path) -> Result<counter_core::store::Buckets> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CounterError::Restore(format!("{}: {e}", path.display())))?;
        snapshot::decode(&bytes)
    }

    /// Snapshot every `interval` until `shutdown`. The final flush on
    /// shutdown is left to the caller so it can run after the queue drains.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.snapshot_all().await;
                }
            }
        }
        tracing::debug!("persistence loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_core::{Datapoint, RawSample};

    fn manager(dir: &Path) -> (Arc<MetricStore>, PersistenceManager) {
        let store = Arc::new(MetricStore::new());
        let m = PersistenceManager::new(Arc::clone(&store), dir, Arc::new(ServerMetrics::default()));
        (store, m)
    }

    #[tokio::test]
    async fn snapshot_creates_directory_and_leaves_no_tmp() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let (store, m) = manager(&dir);
        store.apply(&RawSample::single("hits", Datapoint::new(3.0, 1)), "2024-01-01 10:00");

        let report = m.snapshot_all().await;
        assert_eq!(report, SnapshotReport { written: 1, failed: 0 });

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["hits.json"]);
    }

    #[tokio::test]
    async fn empty_series_is_still_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, m) = manager(tmp.path());
        store.get_or_create("idle");
        m.snapshot_all().await;
        let body = std::fs::read_to_string(tmp.path().join("idle.json")).unwrap();
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn missing_directory_is_a_fresh_store() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, m) = manager(&tmp.path().join("absent"));
        assert_eq!(m.restore_all().await, RestoreReport::default());
        assert!(store.is_empty());
    }
}
