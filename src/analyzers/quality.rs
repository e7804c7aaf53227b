//! Quality tier classification and weighted scoring.

use std::fmt;

use serde::Serialize;

/// Converts a relative absolute error into a quality tier.
///
/// | Range          | Tier      |
/// |----------------|-----------|
/// | < 0.05         | Excellent |
/// | [0.05, 0.20)   | Good      |
/// | >= 0.20        | Poor      |
///
/// The partition is total over `[0, inf)`: every finite non-negative input
/// lands in exactly one tier.
pub fn classify(rel_abs_error: f64) -> QualityTier {
    match rel_abs_error {
        e if e < 0.05 => QualityTier::Excellent,
        e if e < 0.20 => QualityTier::Good,
        _ => QualityTier::Poor,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityTier {
    Excellent,
    Good,
    Poor,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityTier::Excellent => "excellent",
            QualityTier::Good => "good",
            QualityTier::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// Tally of records per quality tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub excellent: usize,
    pub good: usize,
    pub poor: usize,
}

impl TierCounts {
    pub fn add(&mut self, tier: QualityTier) {
        match tier {
            QualityTier::Excellent => self.excellent += 1,
            QualityTier::Good => self.good += 1,
            QualityTier::Poor => self.poor += 1,
        }
    }

    /// Classifies and tallies every error value in one pass.
    pub fn from_errors<I: IntoIterator<Item = f64>>(errors: I) -> Self {
        let mut counts = TierCounts::default();
        for e in errors {
            counts.add(classify(e));
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.poor
    }
}

/// Weighted quality score over a tier tally:
/// `(excellent * 100 + good * 75) / total`, with `Poor` contributing 0.
///
/// Returns `None` for an empty tally; the score over zero records is
/// undefined, not 0 and not NaN.
pub fn score(counts: &TierCounts) -> Option<f64> {
    let total = counts.total();
    if total == 0 {
        return None;
    }
    Some((counts.excellent as f64 * 100.0 + counts.good as f64 * 75.0) / total as f64)
}
