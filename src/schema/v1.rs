use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    pub test: String,
    pub test_label: String,
    pub min_antigens: usize,
    pub count_rule: String,
    pub antigens: Vec<String>,
    pub thresholds: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputMeta {
    pub lab_rows: Option<u64>,
    pub reference_rows: Option<u64>,
    pub joined_rows: Option<u64>,
    pub lab_unmatched: Option<u64>,
    pub reference_unmatched: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
    pub false_positive: u64,
    pub inconclusive: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scores {
    pub counts: ConfusionCounts,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub sensitivity_display: String,
    pub specificity_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRow {
    pub label: String,
    pub sample_group: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPoint {
    pub min_antigens: usize,
    pub counts: ConfusionCounts,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LymeDxV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub params: Params,
    pub input_meta: InputMeta,
    pub scores: Option<Scores>,
    pub chart: Vec<ChartRow>,
    pub sweep: Vec<SweepPoint>,
    pub warnings: Vec<String>,
}

impl LymeDxV1 {
    pub fn empty(tool_version: &str, params: Params) -> Self {
        Self {
            tool: "kira-lymedx".to_string(),
            version: tool_version.to_string(),
            schema_version: "v1".to_string(),
            params,
            input_meta: InputMeta::default(),
            scores: None,
            chart: Vec::new(),
            sweep: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
