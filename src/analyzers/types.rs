//! Data types shared across the analytics pipeline.

use serde::Serialize;

/// A single row of the calibration table: one (area, metric) estimate
/// compared against its known target at a given training epoch.
///
/// `rel_abs_error` is precomputed by the producing pipeline
/// (`|error| / max(|target|, eps)`) and is trusted, never re-derived here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub area: String,
    pub metric: String,
    pub estimate: f64,
    pub target: f64,
    pub error: f64,
    pub abs_error: f64,
    pub rel_abs_error: f64,
    pub validated: bool,
    pub epoch: u32,
}

/// One band of a banded metric series, values carried verbatim from the
/// matching record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandPoint {
    pub band_index: u32,
    pub lower_bound: f64,
    /// `None` for the open-ended top band.
    pub upper_bound: Option<f64>,
    pub estimate: f64,
    pub target: f64,
    pub error: f64,
    pub rel_abs_error: f64,
}

/// Summary statistics over one ordered band series.
#[derive(Debug, Clone, Serialize)]
pub struct BandSeriesSummary {
    pub count: usize,
    pub mean_rel_error: f64,
    pub stddev_rel_error: f64,
    /// Band index with the lowest relative error (first wins on ties).
    pub best_band: u32,
    pub best_rel_error: f64,
    /// Band index with the highest relative error (first wins on ties).
    pub worst_band: u32,
    pub worst_rel_error: f64,
}

/// One catalogue slot resolved for a specific area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaPoint {
    pub label: String,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub estimate: f64,
    pub target: f64,
    pub error: f64,
    pub rel_abs_error: f64,
}

/// Per-area aggregation result. Recomputed on demand, never persisted.
/// Only areas with at least one surviving point are ever returned.
#[derive(Debug, Clone, Serialize)]
pub struct AreaSummary {
    pub area: String,
    pub points: Vec<AreaPoint>,
    pub mean_rel_error: f64,
}
