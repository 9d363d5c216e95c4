//! Self-observability for the counter service.
//!
//! The service's own counters (ingestion outcomes, evictions, snapshot
//! writes) are kept as atomics and rendered by the `/metrics` handler in
//! Prometheus text format. They are separate from the user metric store.

pub mod metrics;
