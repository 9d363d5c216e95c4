//! Process lifecycle: restore, background loops, and ordered shutdown.
//!
//! Startup restores snapshots before the consumer exists. Shutdown cancels
//! every loop, waits for the consumer to drain the closed queue, then runs a
//! final snapshot pass.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use counter_core::MetricStore;

use crate::app_state::AppState;
use crate::config::CounterConfig;
use crate::ingest::{self, Consumer};
use crate::obs::metrics::ServerMetrics;
use crate::persist::PersistenceManager;
use crate::retention::RetentionSweeper;
use crate::sampler;

pub struct Background {
    shutdown: CancellationToken,
    consumer: JoinHandle<()>,
    loops: Vec<(&'static str, JoinHandle<()>)>,
    persistence: Arc<PersistenceManager>,
}

/// Restore state and spawn the consumer, sweeper, persistence loop and
/// (if enabled) the sampler. Returns the request-handler state.
pub async fn start(cfg: CounterConfig) -> (AppState, Background) {
    let metrics = Arc::new(ServerMetrics::default());
    let store = Arc::new(MetricStore::new());

    let persistence = Arc::new(PersistenceManager::new(
        Arc::clone(&store),
        cfg.persistence.data_dir.clone(),
        Arc::clone(&metrics),
    ));
    persistence.restore_all().await;

    let shutdown = CancellationToken::new();
    let (ingest, rx) = ingest::channel(cfg.ingest.queue_capacity);

    let consumer = tokio::spawn(
        Consumer::new(Arc::clone(&store), rx, Arc::clone(&metrics)).run(shutdown.child_token()),
    );

    let mut loops = Vec::new();

    let sweeper = RetentionSweeper::new(Arc::clone(&store), cfg.retention.window(), Arc::clone(&metrics));
    loops.push((
        "retention",
        tokio::spawn(sweeper.run(cfg.retention.sweep_interval(), shutdown.child_token())),
    ));

    loops.push((
        "persistence",
        tokio::spawn(Arc::clone(&persistence).run(cfg.persistence.interval(), shutdown.child_token())),
    ));

    if cfg.sampler.enabled {
        loops.push((
            "sampler",
            tokio::spawn(sampler::run(ingest.clone(), cfg.sampler.clone(), shutdown.child_token())),
        ));
    }

    let state = AppState::new(cfg, store, ingest, metrics);
    let background = Background { shutdown, consumer, loops, persistence };
    (state, background)
}

impl Background {
    /// Stop every loop, drain the queue, then flush snapshots once more.
    pub async fn shutdown(self) {
        self.shutdown.cancel();

        for (name, handle) in self.loops {
            if let Err(e) = handle.await {
                tracing::warn!(task = name, error = %e, "background task ended abnormally");
            }
        }
        if let Err(e) = self.consumer.await {
            tracing::warn!(task = "consumer", error = %e, "background task ended abnormally");
        }

        let report = self.persistence.snapshot_all().await;
        tracing::info!(written = report.written, failed = report.failed, "final snapshot written");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_core::{Datapoint, RawSample};

    fn cfg(dir: &std::path::Path) -> CounterConfig {
        let mut cfg = CounterConfig::default();
        cfg.persistence.data_dir = dir.to_string_lossy().into_owned();
        cfg
    }

    #[tokio::test]
    async fn accepted_samples_survive_restart() {
        let tmp = tempfile::tempdir().unwrap();

        let (state, background) = start(cfg(tmp.path())).await;
        state
            .ingest()
            .enqueue(RawSample::single("requests", Datapoint::new(10.0, 2)))
            .unwrap();
        background.shutdown().await;
        assert!(state.ingest().enqueue(RawSample::default()).is_err());

        let (state, background) = start(cfg(tmp.path())).await;
        let buckets = state.store().lookup("requests").unwrap().snapshot();
        assert_eq!(buckets.len(), 1);
        let b = buckets.values().next().unwrap();
        assert_eq!((b.sum(), b.count(), b.average()), (10.0, 2, 5.0));
        background.shutdown().await;
    }
}
