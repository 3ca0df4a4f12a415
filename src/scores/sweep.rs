use crate::classify::{DiagnosticRule, TestSelector, classify};
use crate::join::JoinedSample;
use crate::scores::{ConfusionCounts, score};

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub min_count: usize,
    pub counts: ConfusionCounts,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
}

/// Re-scores the lab rule for every minimum count from 1 up to the number of
/// included antigens, keeping thresholds and comparison fixed.
pub fn sweep_min_count(samples: &[JoinedSample], rule: &DiagnosticRule) -> Vec<SweepPoint> {
    (1..=rule.antigens.len())
        .map(|min_count| {
            let candidate = rule.with_min_count(min_count);
            let summary = score(&classify(samples, &candidate, TestSelector::Rule));
            SweepPoint {
                min_count,
                counts: summary.counts,
                sensitivity: summary.sensitivity,
                specificity: summary.specificity,
            }
        })
        .collect()
}
