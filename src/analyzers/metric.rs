//! Metric identifier parsing.
//!
//! Compound metric strings carry structure in their names. Two shapes are
//! recognized:
//!
//! * banded metrics, e.g. `hmrc/pension_income_band_3_10_000_to_20_000`,
//!   which decompose into a source, an amount/count kind, a band index and a
//!   numeric range;
//! * flat catalogue metrics (age decades, employment-income brackets),
//!   resolved by exact-string lookup.
//!
//! Everything else is an unstructured facet. Parsing is total: no input
//! string is an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Band index reserved for the aggregate/total pseudo-band. Never appears in
/// a per-band series.
pub const AGGREGATE_BAND_INDEX: u32 = 55;

/// Grammar of a banded metric marker:
/// `<source>_[count_]income_band_<N>_<lower>_to_<upper|inf>`.
///
/// The source is the identifier segment immediately before the marker; a
/// `/`-separated path prefix (e.g. `hmrc/`) is not part of it. Numeric fields
/// may carry `_` or `,` grouping separators.
static BAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-Za-z][A-Za-z0-9_]*?)_(count_)?income_band_(\d+)_([0-9][0-9_,.]*)_to_(inf|[0-9][0-9_,.]*)",
    )
    .expect("invalid band pattern")
});

/// Whether a banded metric measures a total amount or a population count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BandKind {
    Amount,
    Count,
}

/// A parsed `<source>_income_band_...` metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandedFacet {
    pub source: String,
    pub kind: BandKind,
    pub band_index: u32,
    pub lower_bound: f64,
    /// `None` when the metric names an `inf` upper bound.
    pub upper_bound: Option<f64>,
}

/// Which fixed catalogue a flat facet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlatKind {
    Age,
    EmploymentIncome,
}

/// A metric resolved from one of the fixed flat catalogues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatFacet {
    pub kind: FlatKind,
    pub label: &'static str,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
}

/// Structured meaning of a metric identifier string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum MetricFacet {
    Banded(BandedFacet),
    Flat(FlatFacet),
    /// No recognized structure; the raw string is kept as an opaque label.
    /// Still valid for generic summaries, ineligible for band analysis.
    Unstructured { metric: String },
}

impl MetricFacet {
    pub fn as_banded(&self) -> Option<&BandedFacet> {
        match self {
            MetricFacet::Banded(b) => Some(b),
            _ => None,
        }
    }
}

/// One entry of a fixed flat catalogue: a literal metric string mapped to a
/// labelled numeric range. Static configuration, not discovered at runtime.
#[derive(Debug, Clone, Copy)]
pub struct CatalogueEntry {
    pub metric: &'static str,
    pub label: &'static str,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
}

/// Eight age decade buckets covering 0-80.
pub static AGE_CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry { metric: "age_0_10", label: "0-10", lower_bound: 0.0, upper_bound: Some(10.0) },
    CatalogueEntry { metric: "age_10_20", label: "10-20", lower_bound: 10.0, upper_bound: Some(20.0) },
    CatalogueEntry { metric: "age_20_30", label: "20-30", lower_bound: 20.0, upper_bound: Some(30.0) },
    CatalogueEntry { metric: "age_30_40", label: "30-40", lower_bound: 30.0, upper_bound: Some(40.0) },
    CatalogueEntry { metric: "age_40_50", label: "40-50", lower_bound: 40.0, upper_bound: Some(50.0) },
    CatalogueEntry { metric: "age_50_60", label: "50-60", lower_bound: 50.0, upper_bound: Some(60.0) },
    CatalogueEntry { metric: "age_60_70", label: "60-70", lower_bound: 60.0, upper_bound: Some(70.0) },
    CatalogueEntry { metric: "age_70_80", label: "70-80", lower_bound: 70.0, upper_bound: Some(80.0) },
];

/// Six employment-income brackets from £20K up to the open-ended £150K+ top.
pub static EMPLOYMENT_INCOME_CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry {
        metric: "employment_income_20000_40000",
        label: "20k-40k",
        lower_bound: 20_000.0,
        upper_bound: Some(40_000.0),
    },
    CatalogueEntry {
        metric: "employment_income_40000_60000",
        label: "40k-60k",
        lower_bound: 40_000.0,
        upper_bound: Some(60_000.0),
    },
    CatalogueEntry {
        metric: "employment_income_60000_80000",
        label: "60k-80k",
        lower_bound: 60_000.0,
        upper_bound: Some(80_000.0),
    },
    CatalogueEntry {
        metric: "employment_income_80000_100000",
        label: "80k-100k",
        lower_bound: 80_000.0,
        upper_bound: Some(100_000.0),
    },
    CatalogueEntry {
        metric: "employment_income_100000_150000",
        label: "100k-150k",
        lower_bound: 100_000.0,
        upper_bound: Some(150_000.0),
    },
    CatalogueEntry {
        metric: "employment_income_150000_plus",
        label: "150k+",
        lower_bound: 150_000.0,
        upper_bound: None,
    },
];

fn flat_lookup(metric: &str) -> Option<FlatFacet> {
    let (kind, entry) = AGE_CATALOGUE
        .iter()
        .map(|e| (FlatKind::Age, e))
        .chain(
            EMPLOYMENT_INCOME_CATALOGUE
                .iter()
                .map(|e| (FlatKind::EmploymentIncome, e)),
        )
        .find(|(_, e)| e.metric == metric)?;

    Some(FlatFacet {
        kind,
        label: entry.label,
        lower_bound: entry.lower_bound,
        upper_bound: entry.upper_bound,
    })
}

/// Parses a numeric field of the band marker, stripping grouping separators.
fn parse_bound(field: &str) -> Option<f64> {
    let cleaned: String = field.chars().filter(|c| *c != '_' && *c != ',').collect();
    cleaned.parse().ok()
}

/// Decomposes a metric string into its structured facet.
///
/// Total and deterministic: depends only on the input string, and a string
/// matching neither shape yields an [`MetricFacet::Unstructured`] facet
/// rather than an error.
pub fn parse_metric(metric: &str) -> MetricFacet {
    if let Some(caps) = BAND_PATTERN.captures(metric) {
        let band_index = caps[3].parse::<u32>().ok();
        let lower_bound = parse_bound(&caps[4]);
        let upper = &caps[5];
        let upper_bound = if upper == "inf" {
            Some(None)
        } else {
            parse_bound(upper).map(Some)
        };

        // A marker whose numeric fields do not parse is treated as
        // unstructured rather than half-parsed.
        if let (Some(band_index), Some(lower_bound), Some(upper_bound)) =
            (band_index, lower_bound, upper_bound)
        {
            let kind = if caps.get(2).is_some() {
                BandKind::Count
            } else {
                BandKind::Amount
            };
            return MetricFacet::Banded(BandedFacet {
                source: caps[1].to_string(),
                kind,
                band_index,
                lower_bound,
                upper_bound,
            });
        }
    }

    if let Some(flat) = flat_lookup(metric) {
        return MetricFacet::Flat(flat);
    }

    MetricFacet::Unstructured {
        metric: metric.to_string(),
    }
}

/// Reconstructs the canonical metric string for a banded facet. Inverse of
/// [`parse_metric`] for the banded shape.
pub fn banded_metric_string(facet: &BandedFacet) -> String {
    let infix = match facet.kind {
        BandKind::Amount => "",
        BandKind::Count => "count_",
    };
    let upper = match facet.upper_bound {
        Some(u) => format!("{u}"),
        None => "inf".to_string(),
    };
    format!(
        "{}_{}income_band_{}_{}_to_{}",
        facet.source, infix, facet.band_index, facet.lower_bound, upper
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_banded_amount_with_path_prefix() {
        let facet = parse_metric("hmrc/pension_income_band_3_10_000_to_20_000");
        assert_eq!(
            facet,
            MetricFacet::Banded(BandedFacet {
                source: "pension".to_string(),
                kind: BandKind::Amount,
                band_index: 3,
                lower_bound: 10_000.0,
                upper_bound: Some(20_000.0),
            })
        );
    }

    #[test]
    fn test_parse_banded_count_infix() {
        let facet = parse_metric("self_employment_count_income_band_1_0_to_10_000");
        let banded = facet.as_banded().expect("banded");
        assert_eq!(banded.source, "self_employment");
        assert_eq!(banded.kind, BandKind::Count);
        assert_eq!(banded.band_index, 1);
        assert_eq!(banded.lower_bound, 0.0);
        assert_eq!(banded.upper_bound, Some(10_000.0));
    }

    #[test]
    fn test_parse_open_ended_top_band() {
        let facet = parse_metric("dividends_income_band_12_150_000_to_inf");
        let banded = facet.as_banded().expect("banded");
        assert_eq!(banded.upper_bound, None);
        assert_eq!(banded.lower_bound, 150_000.0);
    }

    #[test]
    fn test_parse_aggregate_pseudo_band() {
        // Band 55 parses like any other; exclusion happens in aggregation.
        let facet = parse_metric("pension_income_band_55_0_to_inf");
        assert_eq!(facet.as_banded().expect("banded").band_index, 55);
    }

    #[test]
    fn test_parse_flat_age() {
        match parse_metric("age_30_40") {
            MetricFacet::Flat(f) => {
                assert_eq!(f.kind, FlatKind::Age);
                assert_eq!(f.label, "30-40");
                assert_eq!(f.lower_bound, 30.0);
                assert_eq!(f.upper_bound, Some(40.0));
            }
            other => panic!("expected flat facet, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_flat_employment_top_bracket() {
        match parse_metric("employment_income_150000_plus") {
            MetricFacet::Flat(f) => {
                assert_eq!(f.kind, FlatKind::EmploymentIncome);
                assert_eq!(f.upper_bound, None);
            }
            other => panic!("expected flat facet, got {other:?}"),
        }
    }

    #[test]
    fn test_unstructured_inputs() {
        for metric in ["household_count", "", "no_underscores_here", "age_95_100"] {
            match parse_metric(metric) {
                MetricFacet::Unstructured { metric: raw } => assert_eq!(raw, metric),
                other => panic!("expected unstructured for {metric:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_metric("hmrc/pension_income_band_3_10_000_to_20_000");
        let b = parse_metric("hmrc/pension_income_band_3_10_000_to_20_000");
        assert_eq!(a, b);
    }

    #[test]
    fn test_banded_round_trip() {
        let cases = [
            ("pension", BandKind::Amount, 3, 10_000.0, Some(20_000.0)),
            ("pension", BandKind::Count, 3, 10_000.0, Some(20_000.0)),
            ("dividends", BandKind::Amount, 12, 150_000.0, None),
            ("property", BandKind::Count, 0, 0.0, Some(5_000.0)),
        ];
        for (source, kind, band_index, lower_bound, upper_bound) in cases {
            let facet = BandedFacet {
                source: source.to_string(),
                kind,
                band_index,
                lower_bound,
                upper_bound,
            };
            let metric = banded_metric_string(&facet);
            assert_eq!(
                parse_metric(&metric),
                MetricFacet::Banded(facet),
                "round trip failed for {metric}"
            );
        }
    }
}
