//! Ingestion pipeline: a bounded FIFO of raw samples and its single consumer.
//!
//! HTTP writers only ever `try_send`, so a saturated queue surfaces as
//! `QueueFull` instead of blocking the request. The consumer is the sole
//! writer of bucket contents, which keeps per-bucket arithmetic serialized
//! without atomics.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use counter_core::error::{CounterError, Result};
use counter_core::{timekey, MetricStore, RawSample};

use crate::obs::metrics::ServerMetrics;

/// Source of the minute key applied at consumption time.
pub type MinuteClock = fn() -> String;

/// Build a queue holding at most `capacity` pending samples.
pub fn channel(capacity: usize) -> (IngestHandle, IngestReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (IngestHandle { tx, capacity }, IngestReceiver { rx })
}

/// Producer side, cloned into request handlers and the sampler.
#[derive(Clone, Debug)]
pub struct IngestHandle {
    tx: mpsc::Sender<RawSample>,
    capacity: usize,
}

impl IngestHandle {
    /// Queue a sample without waiting.
    pub fn enqueue(&self, sample: RawSample) -> Result<()> {
        match self.tx.try_send(sample) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(CounterError::QueueFull),
            Err(TrySendError::Closed(_)) => {
                Err(CounterError::Internal("ingestion queue closed".into()))
            }
        }
    }

    /// Samples waiting for the consumer.
    pub fn pending(&self) -> usize {
        self.capacity.saturating_sub(self.tx.capacity())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the consumer is gone; nothing enqueued now would be applied.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct IngestReceiver {
    rx: mpsc::Receiver<RawSample>,
}

/// The single consumer loop.
pub struct Consumer {
    store: Arc<MetricStore>,
    rx: mpsc::Receiver<RawSample>,
    metrics: Arc<ServerMetrics>,
    clock: MinuteClock,
}

impl Consumer {
    pub fn new(store: Arc<MetricStore>, rx: IngestReceiver, metrics: Arc<ServerMetrics>) -> Self {
        Self { store, rx: rx.rx, metrics, clock: timekey::now_key }
    }

    /// Replace the wall clock (tests pin samples to a known minute).
    pub fn with_clock(mut self, clock: MinuteClock) -> Self {
        self.clock = clock;
        self
    }

    fn apply(&self, sample: &RawSample) {
        let minute_key = (self.clock)();
        let report = self.store.apply(sample, &minute_key);
        for (metric, error) in &report.rejected {
            tracing::warn!(metric = %metric, minute = %minute_key, error = %error, "datapoint dropped");
        }
        self.metrics.datapoints_applied.add(&[], report.applied as u64);
        if !report.rejected.is_empty() {
            self.metrics.datapoints_rejected.add(&[], report.rejected.len() as u64);
        }
        self.metrics.metrics_tracked.set(self.store.len() as i64);
    }

    /// Apply samples until `shutdown` fires, then close the queue and apply
    /// whatever was already accepted.
    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.rx.recv() => match next {
                    Some(sample) => self.apply(&sample),
                    None => {
                        tracing::info!("all ingestion handles dropped, consumer exiting");
                        return;
                    }
                },
            }
        }

        self.rx.close();
        let mut drained = 0usize;
        while let Some(sample) = self.rx.recv().await {
            self.apply(&sample);
            drained += 1;
        }
        tracing::info!(drained, "ingestion queue drained");
    }
}
