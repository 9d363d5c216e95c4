//! Axum router wiring.
//!
//! `/metric` routes serve the store; `/healthz`, `/readyz` and `/metrics`
//! are operational.

use axum::{routing::get, Router};

use crate::{app_state::AppState, http::handlers, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metric", get(handlers::list_metrics).post(handlers::write_metrics))
        .route("/metric/:name", get(handlers::get_metric))
        .route("/metric/:name/:chart", get(handlers::get_metric_chart))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
