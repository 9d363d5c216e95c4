use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;

use counter_core::error::CounterError;
use counter_core::store::Buckets;
use counter_core::RawSample;

use crate::app_state::AppState;
use crate::chart::Dimension;
use crate::http::ApiError;
use crate::query;

#[derive(Debug, Serialize)]
pub struct MetricList {
    pub metrics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Status {
    pub status: &'static str,
}

/// `GET /metric`
pub async fn list_metrics(State(app): State<AppState>) -> Json<MetricList> {
    Json(MetricList { metrics: query::list_metrics(app.store()) })
}

/// `POST /metric`
pub async fn write_metrics(State(app): State<AppState>, body: Bytes) -> Result<Json<Status>, ApiError> {
    let sample = RawSample::from_json(&body).inspect_err(|_| {
        app.metrics().writes.inc(&[("result", "invalid")]);
    })?;

    match app.ingest().enqueue(sample) {
        Ok(()) => {
            app.metrics().writes.inc(&[("result", "queued")]);
            Ok(Json(Status { status: "Queued" }))
        }
        Err(e) => {
            app.metrics().writes.inc(&[("result", "rejected")]);
            Err(e.into())
        }
    }
}

/// `GET /metric/{name}`
pub async fn get_metric(State(app): State<AppState>, Path(name): Path<String>) -> Result<Json<Buckets>, ApiError> {
    Ok(Json(query::get_series(app.store(), &name)?))
}

/// `GET /metric/{name}/{dimension}.png`
pub async fn get_metric_chart(
    State(app): State<AppState>,
    Path((name, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let dimension = file.strip_suffix(".png").ok_or(CounterError::NotFound)?;
    let points = query::chart_points(app.store(), &name, Dimension::parse(dimension))?;

    let renderer = app.renderer();
    let image = renderer.render(&points)?;
    Ok(([(header::CONTENT_TYPE, renderer.content_type())], image).into_response())
}
