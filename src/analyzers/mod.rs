//! Calibration table analytics.
//!
//! This module turns the flat (epoch, area, metric, estimate, target, error)
//! table into structured facts: downsampled epoch selections, parsed metric
//! facets, quality tier tallies with weighted scores, ordered band series,
//! and ranked per-area summaries. Everything here is a pure function over an
//! immutable record slice.

pub mod areas;
pub mod bands;
pub mod epochs;
pub mod metric;
pub mod quality;
pub mod report;
pub mod types;
pub mod utility;
