//! Random test-data generator.
//!
//! Feeds the ingestion queue like any other writer; it is off by default and
//! has no special access to the store.

use rand::Rng;
use tokio_util::sync::CancellationToken;

use counter_core::error::CounterError;
use counter_core::{Datapoint, RawSample};

use crate::config::SamplerSection;
use crate::ingest::IngestHandle;

/// `count` in `0..50`, `value` = `0..100` × count.
pub fn random_sample(metric: &str) -> RawSample {
    let mut rng = rand::rng();
    let count: u64 = rng.random_range(0..50);
    let value = rng.random_range(0..100u64) as f64 * count as f64;
    RawSample::single(metric, Datapoint::new(value, count))
}

pub async fn run(ingest: IngestHandle, cfg: SamplerSection, shutdown: CancellationToken) {
    tracing::info!(metric = %cfg.metric, interval_ms = cfg.interval_ms, "sample generator enabled");
    let mut ticker = tokio::time::interval(cfg.interval());
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => match ingest.enqueue(random_sample(&cfg.metric)) {
                Ok(()) => {}
                Err(CounterError::QueueFull) => tracing::debug!("sampler skipped a tick, queue full"),
                Err(e) => {
                    tracing::warn!(error = %e, "sampler stopping");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        for _ in 0..200 {
            let s = random_sample("test");
            let p = s.0["test"];
            assert!(p.count < 50);
            assert!(p.value >= 0.0 && p.value <= 99.0 * p.count as f64);
        }
    }

    #[tokio::test]
    async fn feeds_queue_until_shutdown() {
        let (handle, _rx) = crate::ingest::channel(8);
        let shutdown = CancellationToken::new();
        let cfg = SamplerSection { enabled: true, metric: "test".into(), interval_ms: 10 };
        let task = tokio::spawn(run(handle.clone(), cfg, shutdown.clone()));

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while handle.pending() == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        task.await.unwrap();
    }
}
