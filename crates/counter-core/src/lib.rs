//! counter core: the metric store, its data model, and the snapshot codec.
//!
//! This crate holds the concurrent structures that aggregate samples into
//! per-minute buckets, plus the error surface shared with the server. It
//! carries no runtime or HTTP dependencies so the locking discipline can be
//! exercised in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `CounterError`/`Result`.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod error;
pub mod name;
pub mod sample;
pub mod snapshot;
pub mod store;
pub mod timekey;

/// Shared result type.
pub use error::{Result, CounterError};
pub use sample::{Datapoint, RawSample};
pub use store::{ApplyReport, Bucket, MetricSeries, MetricStore};
