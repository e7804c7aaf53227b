//! Loaded calibration table with shared derived structures.
//!
//! Every consumer of the table needs the same two derivations: the parsed
//! facet of each metric string and the downsampled epoch selection. Both are
//! pure functions of the records, so they are computed exactly once at
//! construction and handed out by reference, instead of each consumer
//! re-deriving them per query.

use crate::analyzers::epochs::{DEFAULT_EPOCH_CAP, EpochSelection, select_epochs};
use crate::analyzers::metric::{MetricFacet, parse_metric};
use crate::analyzers::types::Record;

#[derive(Debug, Clone)]
pub struct CalibrationTable {
    records: Vec<Record>,
    /// Index-parallel with `records`.
    facets: Vec<MetricFacet>,
    epochs: EpochSelection,
}

impl CalibrationTable {
    /// Builds the table, parsing every metric and selecting epochs once.
    pub fn new(records: Vec<Record>) -> Self {
        let facets = records.iter().map(|r| parse_metric(&r.metric)).collect();
        let epochs = select_epochs(&records, DEFAULT_EPOCH_CAP);
        CalibrationTable {
            records,
            facets,
            epochs,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn facets(&self) -> &[MetricFacet] {
        &self.facets
    }

    /// Epoch selection at [`DEFAULT_EPOCH_CAP`], computed at construction.
    pub fn epochs(&self) -> &EpochSelection {
        &self.epochs
    }

    /// Maximum epoch present; the canonical "current" snapshot.
    pub fn max_epoch(&self) -> u32 {
        self.epochs.max_epoch
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Materializes the single-epoch view: records and their facets at one
    /// epoch, preserving input order.
    pub fn at_epoch(&self, epoch: u32) -> (Vec<Record>, Vec<MetricFacet>) {
        self.records
            .iter()
            .zip(&self.facets)
            .filter(|(r, _)| r.epoch == epoch)
            .map(|(r, f)| (r.clone(), f.clone()))
            .unzip()
    }
}
