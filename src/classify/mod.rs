//! Diagnostic rule evaluation and confusion labelling.
//!
//! A sample is called positive by the lab rule when enough included antigens
//! exceed their threshold. The call for the selected test is then compared to
//! the reference category to produce a confusion label.

use std::fmt;
use std::ops::RangeInclusive;

use anyhow::{Result, bail};

use crate::join::JoinedSample;
use crate::panel::{PANEL_SIZE, PanelThresholds, antigen_index};

pub const DISEASE_CATEGORY: &str = "Lyme Disease";
pub const CONTROL_CATEGORY: &str = "Control";
pub const POSITIVE_CALL: &str = "Pos";
pub const NEGATIVE_CALL: &str = "Neg";

pub const DEFAULT_MIN_COUNT: usize = 3;
pub const MIN_COUNT_RANGE: RangeInclusive<usize> = 1..=PANEL_SIZE;

/// Count comparison used by the lab rule unless overridden per run.
pub const DEFAULT_COUNT_COMPARISON: CountComparison = CountComparison::AtLeast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Positive,
    Negative,
    Other(String),
}

impl Call {
    pub fn parse(raw: &str) -> Self {
        match raw {
            POSITIVE_CALL => Self::Positive,
            NEGATIVE_CALL => Self::Negative,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Positive => POSITIVE_CALL,
            Self::Negative => NEGATIVE_CALL,
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceCategory {
    Disease,
    Control,
    Other(String),
}

impl ReferenceCategory {
    pub fn parse(raw: &str) -> Self {
        match raw {
            DISEASE_CATEGORY => Self::Disease,
            CONTROL_CATEGORY => Self::Control,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Disease => DISEASE_CATEGORY,
            Self::Control => CONTROL_CATEGORY,
            Self::Other(s) => s,
        }
    }
}

/// Outcomes of the externally performed reference tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTests {
    pub two_tier: Call,
    pub eia: Call,
    pub igm_wb: Call,
    pub igg_wb: Call,
}

/// Which diagnostic test is scored against the reference category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSelector {
    Rule,
    TwoTier,
    Eia,
    IgmWb,
    IggWb,
}

impl TestSelector {
    pub const ALL: [TestSelector; 5] = [
        Self::Rule,
        Self::TwoTier,
        Self::Eia,
        Self::IgmWb,
        Self::IggWb,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::TwoTier => "ttt",
            Self::Eia => "eia",
            Self::IgmWb => "igm-wb",
            Self::IggWb => "igg-wb",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Rule => "Lab Test",
            Self::TwoTier => "TTT",
            Self::Eia => "EIA",
            Self::IgmWb => "IgM WB",
            Self::IggWb => "IgG WB",
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        match Self::ALL.iter().find(|t| t.id() == id) {
            Some(t) => Ok(*t),
            None => {
                let known: Vec<&str> = Self::ALL.iter().map(|t| t.id()).collect();
                bail!("unknown test '{}' (expected one of {})", id, known.join(", "))
            }
        }
    }

    /// Reads this test's call from an external column. `None` for the lab rule.
    pub fn external_call(self, tests: &ExternalTests) -> Option<&Call> {
        match self {
            Self::Rule => None,
            Self::TwoTier => Some(&tests.two_tier),
            Self::Eia => Some(&tests.eia),
            Self::IgmWb => Some(&tests.igm_wb),
            Self::IggWb => Some(&tests.igg_wb),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountComparison {
    AtLeast,
    Greater,
}

impl CountComparison {
    pub fn passes(self, sum: usize, min_count: usize) -> bool {
        match self {
            Self::AtLeast => sum >= min_count,
            Self::Greater => sum > min_count,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::Greater => ">",
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::AtLeast => "at-least",
            Self::Greater => "greater",
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        match id {
            "at-least" => Ok(Self::AtLeast),
            "greater" => Ok(Self::Greater),
            other => bail!("unknown count rule '{}' (expected at-least or greater)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfusionLabel {
    TruePositive,
    TrueNegative,
    FalseNegative,
    FalsePositive,
    Inconclusive,
}

impl ConfusionLabel {
    pub const ALL: [ConfusionLabel; 5] = [
        Self::TruePositive,
        Self::TrueNegative,
        Self::FalseNegative,
        Self::FalsePositive,
        Self::Inconclusive,
    ];

    pub fn from_pair(category: &ReferenceCategory, call: &Call) -> Self {
        match (category, call) {
            (ReferenceCategory::Disease, Call::Positive) => Self::TruePositive,
            (ReferenceCategory::Control, Call::Negative) => Self::TrueNegative,
            (ReferenceCategory::Disease, Call::Negative) => Self::FalseNegative,
            (ReferenceCategory::Control, Call::Positive) => Self::FalsePositive,
            _ => Self::Inconclusive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TruePositive => "True Positive",
            Self::TrueNegative => "True Negative",
            Self::FalseNegative => "False Negative",
            Self::FalsePositive => "False Positive",
            Self::Inconclusive => "No confirmed diagnosis",
        }
    }
}

impl fmt::Display for ConfusionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleAntigen {
    pub name: String,
    pub panel_index: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticRule {
    pub antigens: Vec<RuleAntigen>,
    pub min_count: usize,
    pub comparison: CountComparison,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    /// One entry per included antigen, in rule order.
    pub indicators: Vec<u8>,
    pub sum: usize,
    pub call: Call,
}

impl DiagnosticRule {
    pub fn new(
        included: &[String],
        thresholds: &PanelThresholds,
        min_count: usize,
        comparison: CountComparison,
    ) -> Result<Self> {
        if !MIN_COUNT_RANGE.contains(&min_count) {
            bail!(
                "minimum antigen count must be in {}..={}, got {}",
                MIN_COUNT_RANGE.start(),
                MIN_COUNT_RANGE.end(),
                min_count
            );
        }
        let mut antigens = Vec::with_capacity(included.len());
        for name in included {
            let panel_index = antigen_index(name)
                .ok_or_else(|| anyhow::anyhow!("unknown antigen '{}' in rule", name))?;
            let threshold = thresholds
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("no threshold configured for antigen '{}'", name))?;
            if !threshold.is_finite() {
                bail!("threshold for antigen '{}' is not finite", name);
            }
            antigens.push(RuleAntigen {
                name: name.clone(),
                panel_index,
                threshold,
            });
        }

        Ok(Self {
            antigens,
            min_count,
            comparison,
        })
    }

    pub fn with_min_count(&self, min_count: usize) -> Self {
        Self {
            antigens: self.antigens.clone(),
            min_count,
            comparison: self.comparison,
        }
    }

    /// `measurements` is indexed by panel position. `NaN` never exceeds a threshold.
    /// With no antigens included the sum is zero and every call is negative.
    pub fn evaluate(&self, measurements: &[f64]) -> RuleEvaluation {
        let indicators: Vec<u8> = self
            .antigens
            .iter()
            .map(|a| {
                let value = measurements.get(a.panel_index).copied().unwrap_or(f64::NAN);
                u8::from(value > a.threshold)
            })
            .collect();
        let sum = indicators.iter().map(|&i| i as usize).sum();
        let call = if self.comparison.passes(sum, self.min_count) {
            Call::Positive
        } else {
            Call::Negative
        };
        RuleEvaluation {
            indicators,
            sum,
            call,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSample {
    pub id: String,
    pub sample_group: String,
    pub category: ReferenceCategory,
    pub rule: Option<RuleEvaluation>,
    pub call: Call,
    pub label: ConfusionLabel,
}

/// Output is index-aligned with `samples`.
pub fn classify(
    samples: &[JoinedSample],
    rule: &DiagnosticRule,
    test: TestSelector,
) -> Vec<ClassifiedSample> {
    samples
        .iter()
        .map(|sample| match test.external_call(&sample.tests) {
            Some(call) => labelled(sample, None, call.clone()),
            None => {
                let eval = rule.evaluate(&sample.measurements);
                let call = eval.call.clone();
                labelled(sample, Some(eval), call)
            }
        })
        .collect()
}

/// Labels samples from an external test column alone; no rule is consulted.
pub fn classify_external(
    samples: &[JoinedSample],
    test: TestSelector,
) -> Result<Vec<ClassifiedSample>> {
    samples
        .iter()
        .map(|sample| match test.external_call(&sample.tests) {
            Some(call) => Ok(labelled(sample, None, call.clone())),
            None => bail!("test '{}' needs a diagnostic rule", test.id()),
        })
        .collect()
}

fn labelled(sample: &JoinedSample, rule: Option<RuleEvaluation>, call: Call) -> ClassifiedSample {
    ClassifiedSample {
        id: sample.id.clone(),
        sample_group: sample.sample_group.clone(),
        category: sample.category.clone(),
        rule,
        label: ConfusionLabel::from_pair(&sample.category, &call),
        call,
    }
}
