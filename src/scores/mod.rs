use std::collections::BTreeMap;

use crate::classify::{ClassifiedSample, ConfusionLabel};

pub mod sweep;

pub use sweep::{SweepPoint, sweep_min_count};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
    pub false_positive: usize,
    pub inconclusive: usize,
}

impl ConfusionCounts {
    pub fn from_labels<I: IntoIterator<Item = ConfusionLabel>>(labels: I) -> Self {
        let mut counts = Self::default();
        for label in labels {
            counts.add(label);
        }
        counts
    }

    pub fn add(&mut self, label: ConfusionLabel) {
        match label {
            ConfusionLabel::TruePositive => self.true_positive += 1,
            ConfusionLabel::TrueNegative => self.true_negative += 1,
            ConfusionLabel::FalseNegative => self.false_negative += 1,
            ConfusionLabel::FalsePositive => self.false_positive += 1,
            ConfusionLabel::Inconclusive => self.inconclusive += 1,
        }
    }

    pub fn get(&self, label: ConfusionLabel) -> usize {
        match label {
            ConfusionLabel::TruePositive => self.true_positive,
            ConfusionLabel::TrueNegative => self.true_negative,
            ConfusionLabel::FalseNegative => self.false_negative,
            ConfusionLabel::FalsePositive => self.false_positive,
            ConfusionLabel::Inconclusive => self.inconclusive,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive
            + self.true_negative
            + self.false_negative
            + self.false_positive
            + self.inconclusive
    }

    /// TP / (TP + FN); `None` without any disease-reference calls.
    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// TN / (TN + FP); `None` without any control-reference calls.
    pub fn specificity(&self) -> Option<f64> {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub counts: ConfusionCounts,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
}

impl ScoreSummary {
    pub fn from_counts(counts: ConfusionCounts) -> Self {
        Self {
            sensitivity: counts.sensitivity(),
            specificity: counts.specificity(),
            counts,
        }
    }

    pub fn sensitivity_line(&self) -> String {
        format!("Sensitivity Score: {}", format_percent(self.sensitivity))
    }

    pub fn specificity_line(&self) -> String {
        format!("Specificity Score: {}", format_percent(self.specificity))
    }
}

pub fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

pub fn score(classified: &[ClassifiedSample]) -> ScoreSummary {
    ScoreSummary::from_counts(ConfusionCounts::from_labels(
        classified.iter().map(|s| s.label),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRow {
    pub label: ConfusionLabel,
    pub sample_group: String,
    pub count: usize,
}

/// Sample counts per confusion label, stacked by sample group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartTable {
    pub rows: Vec<ChartRow>,
}

impl ChartTable {
    pub fn total_for(&self, label: ConfusionLabel) -> usize {
        self.rows
            .iter()
            .filter(|r| r.label == label)
            .map(|r| r.count)
            .sum()
    }
}

pub fn chart_table(classified: &[ClassifiedSample]) -> ChartTable {
    let mut counts: BTreeMap<(ConfusionLabel, &str), usize> = BTreeMap::new();
    for sample in classified {
        *counts
            .entry((sample.label, sample.sample_group.as_str()))
            .or_insert(0) += 1;
    }
    ChartTable {
        rows: counts
            .into_iter()
            .map(|((label, group), count)| ChartRow {
                label,
                sample_group: group.to_string(),
                count,
            })
            .collect(),
    }
}
