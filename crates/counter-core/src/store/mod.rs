//! Metric store components.
//!
//! Aggregate buckets, per-metric series (each behind its own lock), and the
//! name -> series registry shared by ingestion, retention, persistence and
//! HTTP reads.

mod bucket;
mod registry;
mod series;

pub use bucket::Bucket;
pub use registry::{ApplyReport, MetricStore};
pub use series::{Buckets, MetricSeries};
