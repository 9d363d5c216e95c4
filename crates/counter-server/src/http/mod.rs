//! HTTP surface for metrics.
//!
//! JSON read/write handlers plus the chart endpoint. Errors are converted to
//! `{"error": ...}` payloads at this boundary.

pub mod error;
pub mod handlers;

pub use error::ApiError;
