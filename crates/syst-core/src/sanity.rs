//! Locally recovered numeric conditions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lower bound on the accepted ratio of corrected to input momentum.
pub const MIN_RATIO: f64 = 0.1;
/// Upper bound on the accepted ratio of corrected to input momentum.
pub const MAX_RATIO: f64 = 2.0;

/// Reason a computed correction was discarded in favour of the unshifted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainWarning {
    /// Corrected over input momentum outside `[MIN_RATIO, MAX_RATIO]`.
    RatioOutOfBand,
    /// Corrected momentum is negative.
    NegativePt,
    /// Corrected momentum is NaN.
    NotANumber,
    /// Input momentum below the validity threshold.
    BelowThreshold,
    /// Input momentum above the validity range.
    AboveThreshold,
    /// Resolution shape parameters read from a table are unusable.
    InvalidShape,
}

/// Counts of domain warnings raised while processing one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTally {
    counts: BTreeMap<DomainWarning, u64>,
}

impl DomainTally {
    /// Empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one warning.
    pub fn record(&mut self, warning: DomainWarning) {
        *self.counts.entry(warning).or_insert(0) += 1;
    }

    /// Number of times `warning` was recorded.
    pub fn count(&self, warning: DomainWarning) -> u64 {
        self.counts.get(&warning).copied().unwrap_or(0)
    }

    /// Total number of warnings.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(&mut self, other: &DomainTally) {
        for (warning, count) in &other.counts {
            *self.counts.entry(*warning).or_insert(0) += count;
        }
    }

    /// Iterates over recorded warnings and their counts.
    pub fn iter(&self) -> impl Iterator<Item = (DomainWarning, u64)> + '_ {
        self.counts.iter().map(|(w, c)| (*w, *c))
    }
}

/// Classifies a corrected momentum against the input it was derived from.
///
/// Returns `None` when the corrected value is acceptable.
pub fn check_corrected(input_pt: f64, corrected_pt: f64) -> Option<DomainWarning> {
    if corrected_pt.is_nan() {
        return Some(DomainWarning::NotANumber);
    }
    if corrected_pt < 0.0 {
        return Some(DomainWarning::NegativePt);
    }
    let ratio = corrected_pt / input_pt;
    if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
        return Some(DomainWarning::RatioOutOfBand);
    }
    None
}

/// Returns `corrected_pt` if acceptable and `fallback` otherwise, tallying the reason.
pub fn sanitize_pt(
    input_pt: f64,
    corrected_pt: f64,
    fallback: f64,
    tally: &mut DomainTally,
) -> f64 {
    match check_corrected(input_pt, corrected_pt) {
        None => corrected_pt,
        Some(warning) => {
            debug!(?warning, input_pt, corrected_pt, fallback, "correction rejected");
            tally.record(warning);
            fallback
        }
    }
}

/// Validates a multiplicative factor applied to `pt`; invalid factors become 1.
pub fn sanitize_factor(pt: f64, factor: f64, tally: &mut DomainTally) -> f64 {
    match check_corrected(pt, pt * factor) {
        None => factor,
        Some(warning) => {
            debug!(?warning, pt, factor, "correction factor rejected");
            tally.record(warning);
            1.0
        }
    }
}
