//! Shared application state for the counter server.
//!
//! Holds the injected metric store and the collaborators request handlers
//! need. Background loops receive the same `Arc<MetricStore>` directly.

use std::sync::Arc;

use counter_core::MetricStore;

use crate::chart::{ChartRenderer, PngLineChart};
use crate::config::CounterConfig;
use crate::ingest::IngestHandle;
use crate::obs::metrics::ServerMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    store: Arc<MetricStore>,
    metrics: Arc<ServerMetrics>,
}

struct AppStateInner {
    cfg: CounterConfig,
    ingest: IngestHandle,
    renderer: Arc<dyn ChartRenderer>,
}

impl AppState {
    pub fn new(
        cfg: CounterConfig,
        store: Arc<MetricStore>,
        ingest: IngestHandle,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self::with_renderer(cfg, store, ingest, metrics, Arc::new(PngLineChart::default()))
    }

    pub fn with_renderer(
        cfg: CounterConfig,
        store: Arc<MetricStore>,
        ingest: IngestHandle,
        metrics: Arc<ServerMetrics>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, ingest, renderer }),
            store,
            metrics,
        }
    }

    pub fn cfg(&self) -> &CounterConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn ingest(&self) -> &IngestHandle {
        &self.inner.ingest
    }

    pub fn renderer(&self) -> Arc<dyn ChartRenderer> {
        Arc::clone(&self.inner.renderer)
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Gauges sampled at scrape time.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("counter_queue_depth", self.ingest().pending() as u64),
            ("counter_queue_capacity", self.ingest().capacity() as u64),
            ("counter_consumer_up", u64::from(!self.ingest().is_closed())),
        ]
    }
}
