use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::ctx::Ctx;
use crate::panel::ANTIGEN_PANEL;

pub fn write_samples_tsv(path: &Path, ctx: &Ctx) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    let n = ctx.joined.len();
    ensure_len(ctx.classified.len(), n, "classified samples")?;
    let bin_names: Vec<&str> = ctx
        .rule
        .as_ref()
        .map(|r| r.antigens.iter().map(|a| a.name.as_str()).collect())
        .unwrap_or_default();

    let mut header = vec![
        "id".to_string(),
        "sample_group".to_string(),
        "sample_category".to_string(),
        "true_diag".to_string(),
    ];
    header.extend(ANTIGEN_PANEL.iter().map(|a| a.to_string()));
    header.extend(bin_names.iter().map(|name| format!("{}_bin", name)));
    header.extend(["sum".to_string(), "call".to_string(), "result".to_string()]);
    writeln!(w, "{}", header.join("\t"))?;

    for (sample, classified) in ctx.joined.iter().zip(&ctx.classified) {
        let mut fields = vec![
            sample.id.clone(),
            sample.sample_group.clone(),
            sample.category.as_str().to_string(),
            sample.true_diag.clone().unwrap_or_default(),
        ];
        fields.extend(sample.measurements.iter().map(|v| format_measurement(*v)));
        match &classified.rule {
            Some(eval) => {
                ensure_len(eval.indicators.len(), bin_names.len(), "indicators")?;
                fields.extend(eval.indicators.iter().map(|i| i.to_string()));
                fields.push(eval.sum.to_string());
            }
            None => {
                fields.extend(std::iter::repeat_n(String::new(), bin_names.len() + 1));
            }
        }
        fields.push(classified.call.as_str().to_string());
        fields.push(classified.label.as_str().to_string());
        writeln!(w, "{}", fields.join("\t"))?;
    }

    Ok(())
}

pub fn write_chart_tsv(path: &Path, ctx: &Ctx) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    let chart = ctx.chart.as_ref().context("chart table missing")?;

    writeln!(w, "result\tsample_group\tcount")?;
    for row in &chart.rows {
        writeln!(w, "{}\t{}\t{}", row.label, row.sample_group, row.count)?;
    }
    Ok(())
}

pub fn write_sweep_tsv(path: &Path, ctx: &Ctx) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    writeln!(w, "min_antigens\ttp\tfn\ttn\tfp\tinconclusive\tsensitivity\tspecificity")?;
    for p in &ctx.sweep_points {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            p.min_count,
            p.counts.true_positive,
            p.counts.false_negative,
            p.counts.true_negative,
            p.counts.false_positive,
            p.counts.inconclusive,
            format_ratio(p.sensitivity),
            format_ratio(p.specificity)
        )?;
    }
    Ok(())
}

fn ensure_len(got: usize, expected: usize, name: &str) -> Result<()> {
    if got != expected {
        bail!("{} length mismatch: {} != {}", name, got, expected);
    }
    Ok(())
}

fn format_measurement(v: f64) -> String {
    if v.is_nan() { String::new() } else { format!("{}", v) }
}

fn format_ratio(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.6}", v),
        None => "NA".to_string(),
    }
}
