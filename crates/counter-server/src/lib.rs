//! counter server library entry.
//!
//! Wires the metric store to its ingestion queue, retention sweeper,
//! persistence manager and HTTP surface. Consumed by the binary
//! (`main.rs`) and by integration tests.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod app_state;
pub mod chart;
pub mod config;
pub mod http;
pub mod ingest;
pub mod lifecycle;
pub mod obs;
pub mod ops;
pub mod persist;
pub mod query;
pub mod retention;
pub mod router;
pub mod sampler;
