use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::classify::{
    ClassifiedSample, CountComparison, DEFAULT_COUNT_COMPARISON, DEFAULT_MIN_COUNT,
    DiagnosticRule, TestSelector,
};
use crate::io::lab_table::LabTable;
use crate::io::reference_table::{DEFAULT_SKIP_ROWS, ReferenceTable};
use crate::join::{JoinStats, JoinedSample};
use crate::panel::{self, PanelThresholds};
use crate::schema::v1::{LymeDxV1, Params};
use crate::scores::{ChartTable, ScoreSummary, SweepPoint};

#[derive(Debug, Clone)]
pub struct InputPaths {
    pub lab: PathBuf,
    pub reference: PathBuf,
    pub reference_skip_rows: usize,
}

impl InputPaths {
    pub fn new(lab: PathBuf, reference: PathBuf) -> Self {
        Self {
            lab,
            reference,
            reference_skip_rows: DEFAULT_SKIP_ROWS,
        }
    }
}

/// Everything the user can change between recomputations.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub test: TestSelector,
    pub min_count: usize,
    pub antigens: Vec<String>,
    pub thresholds: PanelThresholds,
    pub comparison: CountComparison,
}

impl RunParams {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            test: TestSelector::Rule,
            min_count: DEFAULT_MIN_COUNT,
            antigens: panel::full_panel(),
            thresholds: panel::load_builtin()?,
            comparison: DEFAULT_COUNT_COMPARISON,
        })
    }

    pub fn build_rule(&self) -> Result<DiagnosticRule> {
        DiagnosticRule::new(
            &self.antigens,
            &self.thresholds,
            self.min_count,
            self.comparison,
        )
    }

    pub fn to_schema(&self) -> Params {
        let thresholds: BTreeMap<String, f64> = self
            .thresholds
            .defs
            .iter()
            .map(|d| (d.antigen.clone(), d.threshold))
            .collect();
        Params {
            test: self.test.id().to_string(),
            test_label: self.test.label().to_string(),
            min_antigens: self.min_count,
            count_rule: self.comparison.id().to_string(),
            antigens: self.antigens.clone(),
            thresholds,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub json_path: PathBuf,
    pub samples_tsv_path: PathBuf,
    pub chart_tsv_path: PathBuf,
    pub sweep_tsv_path: PathBuf,
}

/// State of one computation. Built fresh for every run and never shared.
#[derive(Debug)]
pub struct Ctx {
    pub input: InputPaths,
    pub params: RunParams,
    pub write_json: bool,
    pub write_tsv: bool,
    pub sweep: bool,
    pub lab: Option<LabTable>,
    pub reference: Option<ReferenceTable>,
    pub joined: Vec<JoinedSample>,
    pub join_stats: Option<JoinStats>,
    pub rule: Option<DiagnosticRule>,
    pub classified: Vec<ClassifiedSample>,
    pub scores: Option<ScoreSummary>,
    pub chart: Option<ChartTable>,
    pub sweep_points: Vec<SweepPoint>,
    pub warnings: Vec<String>,
    pub output: OutputPaths,
    pub report: LymeDxV1,
}

impl Ctx {
    pub fn new(
        input: InputPaths,
        out_dir: PathBuf,
        params: RunParams,
        write_json: bool,
        write_tsv: bool,
        tool_version: &str,
    ) -> Self {
        let json_path = out_dir.join("lymedx.json");
        let samples_tsv_path = out_dir.join("samples.tsv");
        let chart_tsv_path = out_dir.join("chart.tsv");
        let sweep_tsv_path = out_dir.join("sweep.tsv");
        let report = LymeDxV1::empty(tool_version, params.to_schema());
        Self {
            input,
            params,
            write_json,
            write_tsv,
            sweep: false,
            lab: None,
            reference: None,
            joined: Vec::new(),
            join_stats: None,
            rule: None,
            classified: Vec::new(),
            scores: None,
            chart: None,
            sweep_points: Vec::new(),
            warnings: Vec::new(),
            output: OutputPaths {
                out_dir,
                json_path,
                samples_tsv_path,
                chart_tsv_path,
                sweep_tsv_path,
            },
            report,
        }
    }

    pub fn writes_files(&self) -> bool {
        self.write_json || self.write_tsv
    }
}
