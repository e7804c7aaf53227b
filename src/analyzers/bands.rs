//! Band series aggregation for banded metrics.

use crate::analyzers::metric::{AGGREGATE_BAND_INDEX, BandKind, MetricFacet};
use crate::analyzers::types::{BandPoint, BandSeriesSummary, Record};
use crate::analyzers::utility::{mean, stddev};

/// Collects the band series for one `(source, kind)` group.
///
/// `records` and `facets` are index-parallel, as produced by
/// [`crate::table::CalibrationTable`]. Output is ordered ascending by lower
/// bound; the reserved aggregate pseudo-band is excluded, and bands absent
/// from the input are absent from the output, never zero-filled.
pub fn aggregate_bands(
    records: &[Record],
    facets: &[MetricFacet],
    source: &str,
    kind: BandKind,
) -> Vec<BandPoint> {
    let mut points: Vec<BandPoint> = records
        .iter()
        .zip(facets)
        .filter_map(|(record, facet)| {
            let banded = facet.as_banded()?;
            if banded.source != source
                || banded.kind != kind
                || banded.band_index == AGGREGATE_BAND_INDEX
            {
                return None;
            }
            Some(BandPoint {
                band_index: banded.band_index,
                lower_bound: banded.lower_bound,
                upper_bound: banded.upper_bound,
                estimate: record.estimate,
                target: record.target,
                error: record.error,
                rel_abs_error: record.rel_abs_error,
            })
        })
        .collect();

    points.sort_by(|a, b| {
        a.lower_bound
            .total_cmp(&b.lower_bound)
            .then(a.band_index.cmp(&b.band_index))
    });
    points
}

/// Summarizes an ordered band series. Returns `None` for an empty series:
/// mean error over zero bands is undefined.
///
/// Best/worst bands are the arg-min/arg-max of relative error; ties go to the
/// first band encountered in ascending order.
pub fn summarize_series(points: &[BandPoint]) -> Option<BandSeriesSummary> {
    let first = points.first()?;

    let errors: Vec<f64> = points.iter().map(|p| p.rel_abs_error).collect();
    let mean_rel_error = mean(&errors);

    let mut best = first;
    let mut worst = first;
    for p in &points[1..] {
        if p.rel_abs_error < best.rel_abs_error {
            best = p;
        }
        if p.rel_abs_error > worst.rel_abs_error {
            worst = p;
        }
    }

    Some(BandSeriesSummary {
        count: points.len(),
        mean_rel_error,
        stddev_rel_error: stddev(&errors, mean_rel_error),
        best_band: best.band_index,
        best_rel_error: best.rel_abs_error,
        worst_band: worst.band_index,
        worst_rel_error: worst.rel_abs_error,
    })
}

/// Distinct `(source, kind)` band groups present in a facet set, sorted for
/// deterministic report output.
pub fn band_groups(facets: &[MetricFacet]) -> Vec<(String, BandKind)> {
    let mut groups: Vec<(String, BandKind)> = facets
        .iter()
        .filter_map(|f| f.as_banded())
        .map(|b| (b.source.clone(), b.kind))
        .collect();
    groups.sort();
    groups.dedup();
    groups
}
