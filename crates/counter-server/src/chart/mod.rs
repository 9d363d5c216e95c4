//! Chart rendering boundary.
//!
//! A renderer is a pure function from an ordered `(timestamp, value)` series
//! to encoded image bytes. Points are always produced in chronological order.

mod line;

use chrono::NaiveDateTime;

use counter_core::error::Result;
use counter_core::store::{Bucket, Buckets};
use counter_core::timekey;

pub use line::PngLineChart;

pub type Point = (NaiveDateTime, f64);

/// Which bucket field to plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Sum,
    Count,
    Average,
}

impl Dimension {
    /// `sum` and `count` select those fields; anything else plots the average.
    pub fn parse(s: &str) -> Self {
        match s {
            "sum" => Dimension::Sum,
            "count" => Dimension::Count,
            _ => Dimension::Average,
        }
    }

    pub fn value(self, bucket: &Bucket) -> f64 {
        match self {
            Dimension::Sum => bucket.sum(),
            Dimension::Count => bucket.count() as f64,
            Dimension::Average => bucket.average(),
        }
    }
}

/// Chronologically ordered points for one dimension. Keys that do not parse
/// as minute keys are skipped.
pub fn series_points(buckets: &Buckets, dimension: Dimension) -> Vec<Point> {
    let mut points: Vec<Point> = buckets
        .iter()
        .filter_map(|(key, bucket)| match timekey::parse(key) {
            Some(t) => Some((t, dimension.value(bucket))),
            None => {
                tracing::warn!(key = %key, "could not parse time value");
                None
            }
        })
        .collect();
    points.sort_by_key(|(t, _)| *t);
    points
}

pub trait ChartRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn render(&self, points: &[Point]) -> Result<Vec<u8>>;
}
