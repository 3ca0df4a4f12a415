use std::fs;
use std::path::Path;

use kira_lymedx::classify::{ConfusionLabel, CountComparison, TestSelector};
use kira_lymedx::ctx::{Ctx, InputPaths, RunParams};
use kira_lymedx::io::summary::format_summary;
use kira_lymedx::pipeline::Pipeline;
use kira_lymedx::pipeline::stage0_scaffold::Stage0Scaffold;
use kira_lymedx::pipeline::stage1_input::Stage1Input;
use kira_lymedx::pipeline::stage2_join::Stage2Join;
use kira_lymedx::pipeline::stage3_classify::Stage3Classify;
use kira_lymedx::pipeline::stage4_score::Stage4Score;
use kira_lymedx::pipeline::stage5_sweep::Stage5Sweep;
use kira_lymedx::pipeline::stage6_output::Stage6Output;
use serde_json::Value;
use tempfile::TempDir;

const LAB: &str = "ID,P100,P41,OspC,DbpA,BmpA,DbpB,P45,P58,P66,VlsE,ErpL,OspD,true_diag
L#01,10,10,10,10,10,10,10,10,10,10,10,10,lyme
L#02,0,0,0,0,0,0,0,0,0,0,0,0,healthy
L#03,3,2,2,0,0,0,0,0,0,0,0,0,lyme
L#04,3,2,0,0,0,0,0,0,0,0,0,0,lyme
L#05,3,2,2,3,0,0,0,0,0,0,0,0,healthy
L#06,10,10,10,10,10,10,10,10,10,10,10,10,
L#099,0,0,0,0,0,0,0,0,0,0,0,0,
";

const REFERENCE: &str = "CDC Lyme serum repository
export
Code Prefix,Code Number,Sample Group,Sample Category,EIA interpretation,IgM WB Interpretation,IgG WB interpretation,2-tier interpretation 
L,1,Early Lyme,Lyme Disease,Pos,Pos,Neg,Pos
L,2,Healthy,Control,Neg,Neg,Neg,Neg
L,3,Late Lyme,Lyme Disease,Pos,Neg,Pos,Pos
L,4,Early Lyme,Lyme Disease,Neg,Neg,Neg,Neg
L,5,Look-alike,Control,Pos,Neg,Neg,Neg
L,6,Unknown,Pending,,,,
L,7,Healthy,Control,Neg,Neg,Neg,Neg
";

fn write_inputs(dir: &Path) -> InputPaths {
    let lab = dir.join("complete_lyme_data.csv");
    let reference = dir.join("cdc_lyme_data.csv");
    fs::write(&lab, LAB).unwrap();
    fs::write(&reference, REFERENCE).unwrap();
    InputPaths::new(lab, reference)
}

fn run(dir: &Path, params: RunParams, json: bool, tsv: bool, sweep: bool) -> Ctx {
    let input = write_inputs(dir);
    let mut ctx = Ctx::new(input, dir.join("out"), params, json, tsv, "0.0.0-test");
    ctx.sweep = sweep;
    let pipeline = Pipeline::new(vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Input::new()),
        Box::new(Stage2Join::new()),
        Box::new(Stage3Classify::new()),
        Box::new(Stage4Score::new()),
        Box::new(Stage5Sweep::new()),
        Box::new(Stage6Output::new()),
    ]);
    pipeline.run(&mut ctx).unwrap();
    ctx
}

#[test]
fn default_rule_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let ctx = run(tmp.path(), RunParams::builtin().unwrap(), false, false, false);

    let stats = ctx.join_stats.as_ref().unwrap();
    assert_eq!(stats.joined, 6);
    assert_eq!(stats.lab_unmatched, 1);
    assert_eq!(stats.reference_unmatched, 1);

    let labels: Vec<ConfusionLabel> = ctx.classified.iter().map(|c| c.label).collect();
    assert_eq!(
        labels,
        vec![
            ConfusionLabel::TruePositive,
            ConfusionLabel::TrueNegative,
            ConfusionLabel::TruePositive,
            ConfusionLabel::FalseNegative,
            ConfusionLabel::FalsePositive,
            ConfusionLabel::Inconclusive,
        ]
    );

    let summary = ctx.scores.as_ref().unwrap();
    assert_eq!(summary.sensitivity_line(), "Sensitivity Score: 66.67%");
    assert_eq!(summary.specificity_line(), "Specificity Score: 50.00%");
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn greater_count_rule_shifts_boundary_rows() {
    let tmp = TempDir::new().unwrap();
    let mut params = RunParams::builtin().unwrap();
    params.comparison = CountComparison::Greater;
    let ctx = run(tmp.path(), params, false, false, false);

    let counts = ctx.scores.as_ref().unwrap().counts;
    assert_eq!(counts.true_positive, 1);
    assert_eq!(counts.false_negative, 2);
    assert_eq!(counts.false_positive, 1);
}

#[test]
fn external_test_selection() {
    let tmp = TempDir::new().unwrap();
    let mut params = RunParams::builtin().unwrap();
    params.test = TestSelector::Eia;
    let ctx = run(tmp.path(), params, false, false, false);

    let counts = ctx.scores.as_ref().unwrap().counts;
    assert_eq!(counts.true_positive, 2);
    assert_eq!(counts.false_negative, 1);
    assert_eq!(counts.true_negative, 1);
    assert_eq!(counts.false_positive, 1);
    assert_eq!(counts.inconclusive, 1);
    assert!(ctx.classified.iter().all(|c| c.rule.is_none()));

    let summary = format_summary(&ctx).unwrap();
    assert!(summary.contains("Test: EIA"));
}

#[test]
fn json_and_tsv_outputs_written() {
    let tmp = TempDir::new().unwrap();
    let ctx = run(tmp.path(), RunParams::builtin().unwrap(), true, true, true);
    let out = tmp.path().join("out");

    let json: Value =
        serde_json::from_str(&fs::read_to_string(out.join("lymedx.json")).unwrap()).unwrap();
    assert_eq!(json["tool"], "kira-lymedx");
    assert_eq!(json["schema_version"], "v1");
    assert_eq!(json["params"]["test"], "rule");
    assert_eq!(json["params"]["count_rule"], "at-least");
    assert_eq!(json["input_meta"]["joined_rows"], 6);
    assert_eq!(json["scores"]["counts"]["true_positive"], 2);
    assert_eq!(json["scores"]["specificity_display"], "50.00%");
    assert!(json["chart"].is_array());
    assert_eq!(json["sweep"].as_array().unwrap().len(), 12);

    let samples = fs::read_to_string(out.join("samples.tsv")).unwrap();
    let lines: Vec<&str> = samples.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("id\tsample_group\tsample_category\ttrue_diag\tP100"));
    assert!(lines[0].ends_with("OspD_bin\tsum\tcall\tresult"));
    assert!(lines[3].starts_with("L#3\tLate Lyme\tLyme Disease\tlyme"));
    assert!(lines[3].ends_with("\t3\tPos\tTrue Positive"));

    let chart = fs::read_to_string(out.join("chart.tsv")).unwrap();
    assert!(chart.starts_with("result\tsample_group\tcount\n"));
    assert!(chart.contains("True Positive\tEarly Lyme\t1\n"));
    assert!(chart.contains("No confirmed diagnosis\tUnknown\t1\n"));

    let sweep = fs::read_to_string(out.join("sweep.tsv")).unwrap();
    assert_eq!(sweep.lines().count(), 13);
    assert_eq!(ctx.sweep_points.len(), 12);
}

#[test]
fn empty_join_scores_undefined() {
    let tmp = TempDir::new().unwrap();
    let lab = tmp.path().join("lab.csv");
    let reference = tmp.path().join("ref.csv");
    fs::write(&lab, LAB).unwrap();
    fs::write(
        &reference,
        REFERENCE.replace("\nL,", "\nZ,"),
    )
    .unwrap();

    let mut ctx = Ctx::new(
        InputPaths::new(lab, reference),
        tmp.path().join("out"),
        RunParams::builtin().unwrap(),
        false,
        false,
        "0.0.0-test",
    );
    let pipeline = Pipeline::new(vec![
        Box::new(Stage1Input::new()),
        Box::new(Stage2Join::new()),
        Box::new(Stage3Classify::new()),
        Box::new(Stage4Score::new()),
    ]);
    pipeline.run(&mut ctx).unwrap();

    assert!(ctx.joined.is_empty());
    let summary = ctx.scores.as_ref().unwrap();
    assert_eq!(summary.sensitivity, None);
    assert_eq!(summary.specificity, None);
    assert!(ctx.warnings.iter().any(|w| w.contains("no sample keys matched")));
}

#[test]
fn empty_subset_calls_every_sample_negative() {
    let tmp = TempDir::new().unwrap();
    let mut params = RunParams::builtin().unwrap();
    params.antigens.clear();
    let ctx = run(tmp.path(), params, false, true, true);

    let scores = ctx.scores.as_ref().unwrap();
    assert_eq!(scores.counts.true_positive, 0);
    assert_eq!(scores.counts.false_negative, 3);
    assert_eq!(scores.counts.true_negative, 2);
    assert_eq!(scores.counts.false_positive, 0);
    assert_eq!(scores.counts.inconclusive, 1);
    assert_eq!(scores.sensitivity, Some(0.0));
    assert_eq!(scores.specificity, Some(1.0));

    assert!(ctx.sweep_points.is_empty());
    assert!(ctx.warnings.iter().any(|w| w.contains("sweep skipped")));
    let samples = fs::read_to_string(tmp.path().join("out").join("samples.tsv")).unwrap();
    let header = samples.lines().next().unwrap();
    assert!(!header.contains("_bin"));
    assert!(header.ends_with("OspD\tsum\tcall\tresult"));
    assert!(samples.lines().nth(1).unwrap().ends_with("\t0\tNeg\tFalse Negative"));
}

#[test]
fn external_test_ignores_rule_settings() {
    let tmp = TempDir::new().unwrap();
    let mut params = RunParams::builtin().unwrap();
    params.antigens.clear();
    params.min_count = 13;
    params.test = TestSelector::Eia;
    let ctx = run(tmp.path(), params, false, true, false);

    assert!(ctx.rule.is_none());
    let scores = ctx.scores.as_ref().unwrap();
    assert_eq!(scores.counts.true_positive, 2);
    assert_eq!(scores.counts.false_negative, 1);
    assert_eq!(scores.counts.true_negative, 1);
    assert_eq!(scores.counts.false_positive, 1);
    assert_eq!(scores.counts.inconclusive, 1);

    let samples = fs::read_to_string(tmp.path().join("out").join("samples.tsv")).unwrap();
    assert!(samples.lines().nth(1).unwrap().ends_with("\t\tPos\tTrue Positive"));
}

#[test]
fn missing_reference_column_aborts() {
    let tmp = TempDir::new().unwrap();
    let lab = tmp.path().join("lab.csv");
    let reference = tmp.path().join("ref.csv");
    fs::write(&lab, LAB).unwrap();
    fs::write(&reference, REFERENCE.replace("Sample Category", "Category")).unwrap();

    let mut ctx = Ctx::new(
        InputPaths::new(lab, reference),
        tmp.path().join("out"),
        RunParams::builtin().unwrap(),
        false,
        false,
        "0.0.0-test",
    );
    let pipeline = Pipeline::new(vec![Box::new(Stage1Input::new())]);
    let err = pipeline.run(&mut ctx).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("failed to load reference table"));
    assert!(msg.contains("'Sample Category'"));
}
