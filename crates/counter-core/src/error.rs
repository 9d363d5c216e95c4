//! Shared error type across counter crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed write body or config.
    BadRequest,
    /// Unknown metric on read/chart.
    NotFound,
    /// Ingestion backpressure.
    QueueFull,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::QueueFull => "QUEUE_FULL",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CounterError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("aggregate overflow: {0}")]
    Overflow(String),
    #[error("metric not found")]
    NotFound,
    #[error("ingestion queue is full")]
    QueueFull,
    #[error("persistence: {0}")]
    Persistence(String),
    #[error("restore: {0}")]
    Restore(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl CounterError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            CounterError::BadRequest(_)
            | CounterError::InvalidName(_)
            | CounterError::Overflow(_) => ClientCode::BadRequest,
            CounterError::NotFound => ClientCode::NotFound,
            CounterError::QueueFull => ClientCode::QueueFull,
            CounterError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            CounterError::Persistence(_) | CounterError::Restore(_) | CounterError::Internal(_) => {
                ClientCode::Internal
            }
        }
    }
}
