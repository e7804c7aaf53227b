//! Output formatting and persistence for calibration reports.
//!
//! Supports pretty-printing, JSON serialization, and a per-epoch score CSV
//! append.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::report::{CalibrationReport, EpochQuality};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &CalibrationReport) {
    debug!("{:#?}", report);
}

/// Serializes a report as pretty-printed JSON.
pub fn to_json(report: &CalibrationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes a report as pretty-printed JSON to a file.
pub fn write_json(path: &str, report: &CalibrationReport) -> Result<()> {
    std::fs::write(path, to_json(report)?)?;
    info!(path, "Report written");
    Ok(())
}

/// Flat CSV row for one epoch's quality tally.
#[derive(Debug, Serialize)]
struct EpochScoreRow {
    epoch: u32,
    excellent: usize,
    good: usize,
    poor: usize,
    /// Empty field when the epoch had no records.
    score: Option<f64>,
}

/// Appends one per-epoch quality row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, quality: &EpochQuality) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(EpochScoreRow {
        epoch: quality.epoch,
        excellent: quality.counts.excellent,
        good: quality.counts.good,
        poor: quality.counts.poor,
        score: quality.score,
    })?;
    writer.flush()?;

    Ok(())
}
