//! Geographic aggregation and area ranking.
//!
//! For a fixed flat catalogue (age or employment-income bands), each area's
//! records are resolved slot by slot. A slot with no matching record is
//! missing data and is distinct from a slot whose record has a zero target;
//! the historical pipeline dropped both, so the zero-target filter is exposed
//! as an explicit caller choice rather than baked in.

use std::collections::BTreeMap;

use crate::analyzers::metric::CatalogueEntry;
use crate::analyzers::types::{AreaPoint, AreaSummary, Record};
use crate::analyzers::utility::mean;

/// Caller-visible policy for zero-target points (see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFilter {
    /// Drop points whose target is not strictly positive. Matches the
    /// historical behavior, which conflates "missing data" with "target
    /// legitimately zero".
    RequirePositiveTarget,
    /// Keep every resolved point regardless of target.
    KeepAll,
}

/// Sort order for ranked area output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Ascending mean relative error: best performers first.
    BestFirst,
    /// Descending mean relative error: worst performers first.
    WorstFirst,
}

/// Resolves each catalogue slot against one area's records by exact metric
/// match. Missing slots stay `None` so callers can distinguish absence from
/// any filtering they apply afterwards. The first matching record wins, so
/// callers should pre-filter to a single epoch.
pub fn catalogue_slots<'a>(
    area_records: &[&'a Record],
    catalogue: &[CatalogueEntry],
) -> Vec<Option<&'a Record>> {
    catalogue
        .iter()
        .map(|entry| {
            area_records
                .iter()
                .copied()
                .find(|r| r.metric == entry.metric)
        })
        .collect()
}

/// Groups records by area and summarizes each area over the given catalogue.
///
/// Areas with zero surviving points are excluded from the output entirely;
/// a mean over nothing is undefined and never replaced with a sentinel.
/// Output is ordered by area name; use [`rank_areas`] for ranked views.
pub fn aggregate_by_area(
    records: &[Record],
    catalogue: &[CatalogueEntry],
    filter: TargetFilter,
) -> Vec<AreaSummary> {
    let mut by_area: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for record in records {
        by_area.entry(record.area.as_str()).or_default().push(record);
    }

    by_area
        .into_iter()
        .filter_map(|(area, area_records)| {
            let points: Vec<AreaPoint> = catalogue_slots(&area_records, catalogue)
                .into_iter()
                .zip(catalogue)
                .filter_map(|(slot, entry)| {
                    let record = slot?;
                    if filter == TargetFilter::RequirePositiveTarget && record.target <= 0.0 {
                        return None;
                    }
                    Some(AreaPoint {
                        label: entry.label.to_string(),
                        lower_bound: entry.lower_bound,
                        upper_bound: entry.upper_bound,
                        estimate: record.estimate,
                        target: record.target,
                        error: record.error,
                        rel_abs_error: record.rel_abs_error,
                    })
                })
                .collect();

            if points.is_empty() {
                return None;
            }

            let errors: Vec<f64> = points.iter().map(|p| p.rel_abs_error).collect();
            Some(AreaSummary {
                area: area.to_string(),
                mean_rel_error: mean(&errors),
                points,
            })
        })
        .collect()
}

/// Sorts area summaries by mean relative error. Equal means keep the
/// alphabetical order produced by [`aggregate_by_area`].
pub fn rank_areas(mut summaries: Vec<AreaSummary>, order: RankOrder) -> Vec<AreaSummary> {
    summaries.sort_by(|a, b| {
        let cmp = a.mean_rel_error.total_cmp(&b.mean_rel_error);
        match order {
            RankOrder::BestFirst => cmp,
            RankOrder::WorstFirst => cmp.reverse(),
        }
    });
    summaries
}

/// Unweighted mean of per-area mean relative error. `None` when no area has
/// a surviving point.
pub fn overall_mean(summaries: &[AreaSummary]) -> Option<f64> {
    if summaries.is_empty() {
        return None;
    }
    let errors: Vec<f64> = summaries.iter().map(|s| s.mean_rel_error).collect();
    Some(mean(&errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::metric::AGE_CATALOGUE;

    fn age_record(area: &str, metric: &str, target: f64, rel: f64) -> Record {
        Record {
            area: area.to_string(),
            metric: metric.to_string(),
            estimate: target * (1.0 + rel),
            target,
            error: target * rel,
            abs_error: (target * rel).abs(),
            rel_abs_error: rel,
            validated: true,
            epoch: 5,
        }
    }

    #[test]
    fn test_catalogue_slots_distinguish_missing() {
        let a = age_record("E14000530", "age_0_10", 1200.0, 0.02);
        let b = age_record("E14000530", "age_20_30", 900.0, 0.08);
        let records = vec![&a, &b];

        let slots = catalogue_slots(&records, AGE_CATALOGUE);
        assert_eq!(slots.len(), AGE_CATALOGUE.len());
        assert!(slots[0].is_some());
        assert!(slots[1].is_none()); // age_10_20 genuinely absent
        assert!(slots[2].is_some());
    }

    #[test]
    fn test_zero_target_dropped_only_when_required() {
        let records = vec![
            age_record("E14000530", "age_0_10", 1200.0, 0.02),
            age_record("E14000530", "age_10_20", 0.0, 0.50),
        ];

        let strict =
            aggregate_by_area(&records, AGE_CATALOGUE, TargetFilter::RequirePositiveTarget);
        assert_eq!(strict[0].points.len(), 1);
        assert!((strict[0].mean_rel_error - 0.02).abs() < 1e-12);

        let lenient = aggregate_by_area(&records, AGE_CATALOGUE, TargetFilter::KeepAll);
        assert_eq!(lenient[0].points.len(), 2);
        assert!((lenient[0].mean_rel_error - 0.26).abs() < 1e-12);
    }

    #[test]
    fn test_area_with_no_surviving_points_excluded() {
        let records = vec![
            age_record("E14000530", "age_0_10", 1200.0, 0.02),
            // This area only has a zero-target point; under the strict
            // filter it must vanish rather than get a sentinel mean.
            age_record("E14000531", "age_0_10", 0.0, 0.9),
            // This area has no catalogue metrics at all.
            age_record("E14000532", "household_count", 500.0, 0.01),
        ];

        let summaries =
            aggregate_by_area(&records, AGE_CATALOGUE, TargetFilter::RequirePositiveTarget);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].area, "E14000530");
    }

    #[test]
    fn test_ranking_orders() {
        let records = vec![
            age_record("mid", "age_0_10", 100.0, 0.10),
            age_record("best", "age_0_10", 100.0, 0.01),
            age_record("worst", "age_0_10", 100.0, 0.40),
        ];
        let summaries =
            aggregate_by_area(&records, AGE_CATALOGUE, TargetFilter::RequirePositiveTarget);

        let best = rank_areas(summaries.clone(), RankOrder::BestFirst);
        let names: Vec<&str> = best.iter().map(|s| s.area.as_str()).collect();
        assert_eq!(names, vec!["best", "mid", "worst"]);

        let worst = rank_areas(summaries, RankOrder::WorstFirst);
        assert_eq!(worst[0].area, "worst");
    }

    #[test]
    fn test_overall_mean() {
        let records = vec![
            age_record("a", "age_0_10", 100.0, 0.10),
            age_record("b", "age_0_10", 100.0, 0.30),
        ];
        let summaries =
            aggregate_by_area(&records, AGE_CATALOGUE, TargetFilter::RequirePositiveTarget);

        let overall = overall_mean(&summaries).expect("two areas survive");
        assert!((overall - 0.20).abs() < 1e-12);
        assert_eq!(overall_mean(&[]), None);
    }
}
