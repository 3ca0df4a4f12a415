use std::fs;
use std::path::Path;

use kira_lymedx::classify::TestSelector;
use kira_lymedx::ctx::{InputPaths, RunParams};
use kira_lymedx::session::{Session, run_once};
use tempfile::TempDir;

const LAB: &str = "ID,P100,P41,OspC,DbpA,BmpA,DbpB,P45,P58,P66,VlsE,ErpL,OspD
A#01,3,2,2,0,0,0,0,0,0,0,0,0
A#02,0,0,0,0,0,0,0,0,0,0,0,0
A#03,3,0,0,0,0,0,0,0,0,0,0,0
";

const REFERENCE: &str = "banner
banner
Code Prefix,Code Number,Sample Group,Sample Category,EIA interpretation,IgM WB Interpretation,IgG WB interpretation,2-tier interpretation 
A,1,Early Lyme,Lyme Disease,Pos,Neg,Neg,Pos
A,2,Healthy,Control,Neg,Neg,Neg,Neg
A,3,Late Lyme,Lyme Disease,Neg,Neg,Neg,Neg
";

fn inputs(dir: &Path) -> InputPaths {
    let lab = dir.join("lab.csv");
    let reference = dir.join("ref.csv");
    fs::write(&lab, LAB).unwrap();
    fs::write(&reference, REFERENCE).unwrap();
    InputPaths::new(lab, reference)
}

#[test]
fn recompute_after_each_change() {
    let tmp = TempDir::new().unwrap();
    let mut session = Session::new(inputs(tmp.path()), RunParams::builtin().unwrap());

    let first = session.recompute().unwrap();
    assert_eq!(first.scores.counts.true_positive, 1);
    assert_eq!(first.scores.counts.false_negative, 1);

    session.apply("min 1").unwrap();
    let second = session.recompute().unwrap();
    assert_eq!(second.scores.counts.true_positive, 2);
    assert_eq!(second.scores.sensitivity, Some(1.0));

    session.apply("threshold P100 5").unwrap();
    session.apply("antigens P100,P41").unwrap();
    let third = session.recompute().unwrap();
    assert_eq!(third.scores.counts.true_positive, 1);
    assert_eq!(session.params().antigens, vec!["P100", "P41"]);

    session.apply("test ttt").unwrap();
    assert_eq!(session.params().test, TestSelector::TwoTier);
    let fourth = session.recompute().unwrap();
    assert!(fourth.summary.contains("Test: TTT"));
}

#[test]
fn failed_recompute_keeps_last_valid_result() {
    let tmp = TempDir::new().unwrap();
    let input = inputs(tmp.path());
    let mut session = Session::new(input.clone(), RunParams::builtin().unwrap());
    let baseline = session.recompute().unwrap().summary.clone();

    session.apply("min 13").unwrap();
    assert!(session.recompute().is_err());
    let err = session.last_error().unwrap();
    assert!(err.contains("minimum antigen count"));
    assert_eq!(session.last().unwrap().summary, baseline);

    fs::remove_file(&input.lab).unwrap();
    session.apply("min 2").unwrap();
    assert!(session.recompute().is_err());
    assert_eq!(session.last().unwrap().summary, baseline);

    fs::write(&input.lab, LAB).unwrap();
    session.recompute().unwrap();
    assert!(session.last_error().is_none());
    assert_ne!(session.last().unwrap().summary, baseline);
}

#[test]
fn invalid_command_leaves_params_unchanged() {
    let tmp = TempDir::new().unwrap();
    let mut session = Session::new(inputs(tmp.path()), RunParams::builtin().unwrap());

    assert!(session.apply("threshold P41 high").is_err());
    assert!(session.apply("antigens P41,Bogus").is_err());
    assert!(session.apply("test pcr").is_err());
    assert!(session.apply("dance").is_err());
    assert_eq!(session.params().thresholds.get("P41"), Some(1.0));
    assert_eq!(session.params().antigens.len(), 12);
    assert!(session.last().is_none());
}

#[test]
fn run_once_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let input = inputs(tmp.path());
    let params = RunParams::builtin().unwrap();
    let a = run_once(&input, &params).unwrap();
    let b = run_once(&input, &params).unwrap();
    assert_eq!(a.scores, b.scores);
    assert_eq!(a.chart, b.chart);
    assert_eq!(a.summary, b.summary);
}

#[test]
fn external_test_recomputes_with_empty_subset() {
    let tmp = TempDir::new().unwrap();
    let mut session = Session::new(inputs(tmp.path()), RunParams::builtin().unwrap());

    session.apply("antigens none").unwrap();
    let rule_outcome = session.recompute().unwrap();
    assert_eq!(rule_outcome.scores.counts.true_positive, 0);
    assert_eq!(rule_outcome.scores.counts.false_negative, 2);
    assert!(rule_outcome.summary.contains("of no antigens"));

    session.apply("test eia").unwrap();
    let eia = session.recompute().unwrap();
    assert_eq!(eia.scores.counts.true_positive, 1);
    assert_eq!(eia.scores.counts.false_negative, 1);
    assert_eq!(eia.scores.counts.true_negative, 1);
    assert!(session.last_error().is_none());
}
