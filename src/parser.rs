//! CSV ingestion for the calibration table feed.
//!
//! Expected columns, in order:
//! `index, name, metric, estimate, target, error, abs_error, rel_abs_error,
//! validation, epoch` with a header row. The feed is produced by an external
//! pipeline; ingestion is deliberately lenient so one bad row never aborts a
//! load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::analyzers::types::Record;

const FIELD_COUNT: usize = 10;

fn parse_num(field: Option<&str>) -> f64 {
    field.and_then(|f| f.trim().parse().ok()).unwrap_or(0.0)
}

fn parse_epoch(field: Option<&str>) -> u32 {
    field.and_then(|f| f.trim().parse().ok()).unwrap_or(0)
}

/// Reads calibration records from CSV.
///
/// Rows with fewer than ten fields are skipped with a warning; numeric fields
/// that fail to parse default to 0; `validated` is true iff the validation
/// field is exactly `"True"`.
pub fn parse_table<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (i, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("reading CSV row {}", i + 1))?;

        if row.len() < FIELD_COUNT {
            warn!(row = i + 1, fields = row.len(), "Skipping malformed row");
            skipped += 1;
            continue;
        }

        records.push(Record {
            // Column 0 is the producer's row index, unused here.
            area: row.get(1).unwrap_or("").to_string(),
            metric: row.get(2).unwrap_or("").to_string(),
            estimate: parse_num(row.get(3)),
            target: parse_num(row.get(4)),
            error: parse_num(row.get(5)),
            abs_error: parse_num(row.get(6)),
            rel_abs_error: parse_num(row.get(7)),
            validated: row.get(8) == Some("True"),
            epoch: parse_epoch(row.get(9)),
        });
    }

    debug!(
        loaded = records.len(),
        skipped, "Calibration table ingested"
    );
    Ok(records)
}

/// Loads a calibration table from a CSV file on disk.
pub fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let file =
        File::open(path).with_context(|| format!("opening calibration CSV {}", path.display()))?;
    parse_table(file)
}
