use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use counter_core::error::CounterError;

/// `CounterError` as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub CounterError);

impl From<CounterError> for ApiError {
    fn from(e: CounterError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            CounterError::BadRequest(_)
            | CounterError::InvalidName(_)
            | CounterError::Overflow(_) => StatusCode::BAD_REQUEST,
            CounterError::NotFound => StatusCode::NOT_FOUND,
            CounterError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.0 {
            CounterError::BadRequest(_) => "Could not parse incoming metrics",
            CounterError::InvalidName(_) => "Invalid metric name",
            CounterError::Overflow(_) => "Metric aggregate would overflow",
            CounterError::NotFound => "Could not find metric",
            CounterError::QueueFull => "Ingestion queue is full",
            _ => "Internal error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        let body = Json(json!({
            "error": self.message(),
            "code": self.0.client_code().as_str(),
        }));
        (status, body).into_response()
    }
}
