//! Full calibration report: every analytics view combined into one
//! serializable structure, suitable for JSON output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::areas::{
    RankOrder, TargetFilter, aggregate_by_area, overall_mean, rank_areas,
};
use crate::analyzers::bands::{aggregate_bands, band_groups, summarize_series};
use crate::analyzers::metric::{
    AGE_CATALOGUE, BandKind, EMPLOYMENT_INCOME_CATALOGUE, MetricFacet,
};
use crate::analyzers::quality::{TierCounts, score};
use crate::analyzers::types::{BandSeriesSummary, Record};
use crate::table::CalibrationTable;

/// How many areas each ranked list carries.
const RANKING_LIMIT: usize = 10;

/// Tier tally and weighted score for one epoch.
#[derive(Debug, Clone, Serialize)]
pub struct EpochQuality {
    pub epoch: u32,
    pub counts: TierCounts,
    /// `None` when the epoch has no records.
    pub score: Option<f64>,
}

/// Band series summary for one `(source, kind)` group at the max epoch.
#[derive(Debug, Clone, Serialize)]
pub struct BandGroupReport {
    pub source: String,
    pub kind: BandKind,
    pub summary: BandSeriesSummary,
}

/// One row of a ranked area list.
#[derive(Debug, Clone, Serialize)]
pub struct AreaRankEntry {
    pub area: String,
    pub mean_rel_error: f64,
    pub point_count: usize,
}

/// Ranked area views over one flat catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct AreaRankings {
    pub catalogue: String,
    pub area_count: usize,
    pub overall_mean_rel_error: Option<f64>,
    pub best: Vec<AreaRankEntry>,
    pub worst: Vec<AreaRankEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    pub distinct: usize,
    pub selected: usize,
    pub max_epoch: u32,
}

/// Complete report over one loaded table.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub schema_version: u8,
    pub algorithm_version: u8,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub epochs: EpochReport,
    /// Quality at the max epoch.
    pub quality: EpochQuality,
    /// Score trajectory over the downsampled epoch selection.
    pub epoch_series: Vec<EpochQuality>,
    pub band_groups: Vec<BandGroupReport>,
    pub age_rankings: AreaRankings,
    pub employment_rankings: AreaRankings,
}

fn epoch_quality(records: &[Record], epoch: u32) -> EpochQuality {
    let counts = TierCounts::from_errors(records.iter().map(|r| r.rel_abs_error));
    EpochQuality {
        epoch,
        score: score(&counts),
        counts,
    }
}

fn rank_entries(summaries: &[crate::analyzers::types::AreaSummary]) -> Vec<AreaRankEntry> {
    summaries
        .iter()
        .take(RANKING_LIMIT)
        .map(|s| AreaRankEntry {
            area: s.area.clone(),
            mean_rel_error: s.mean_rel_error,
            point_count: s.points.len(),
        })
        .collect()
}

fn area_rankings(
    records: &[Record],
    catalogue: &'static [crate::analyzers::metric::CatalogueEntry],
    name: &str,
) -> AreaRankings {
    let summaries = aggregate_by_area(records, catalogue, TargetFilter::RequirePositiveTarget);
    let overall = overall_mean(&summaries);
    let area_count = summaries.len();

    let best = rank_areas(summaries.clone(), RankOrder::BestFirst);
    let worst = rank_areas(summaries, RankOrder::WorstFirst);

    AreaRankings {
        catalogue: name.to_string(),
        area_count,
        overall_mean_rel_error: overall,
        best: rank_entries(&best),
        worst: rank_entries(&worst),
    }
}

fn band_reports(records: &[Record], facets: &[MetricFacet]) -> Vec<BandGroupReport> {
    band_groups(facets)
        .into_iter()
        .filter_map(|(source, kind)| {
            let points = aggregate_bands(records, facets, &source, kind);
            summarize_series(&points).map(|summary| BandGroupReport {
                source,
                kind,
                summary,
            })
        })
        .collect()
}

/// Builds the complete report for one table. Snapshot views (quality, bands,
/// areas) are taken at the max epoch; the score trajectory covers the
/// downsampled epoch selection.
pub fn build_report(table: &CalibrationTable) -> CalibrationReport {
    let selection = table.epochs();
    let (current, current_facets) = table.at_epoch(selection.max_epoch);

    let epoch_series = selection
        .selected
        .iter()
        .map(|&epoch| {
            let (records, _) = table.at_epoch(epoch);
            epoch_quality(&records, epoch)
        })
        .collect();

    let mut distinct: Vec<u32> = table.records().iter().map(|r| r.epoch).collect();
    distinct.sort_unstable();
    distinct.dedup();

    CalibrationReport {
        schema_version: 1,
        algorithm_version: 1,
        generated_at: Utc::now(),
        record_count: table.len(),
        epochs: EpochReport {
            distinct: distinct.len(),
            selected: selection.selected.len(),
            max_epoch: selection.max_epoch,
        },
        quality: epoch_quality(&current, selection.max_epoch),
        epoch_series,
        band_groups: band_reports(&current, &current_facets),
        age_rankings: area_rankings(&current, AGE_CATALOGUE, "age"),
        employment_rankings: area_rankings(&current, EMPLOYMENT_INCOME_CATALOGUE, "employment"),
    }
}
