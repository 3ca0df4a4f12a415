use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::schema::v1::{ChartRow, ConfusionCounts, LymeDxV1, Scores, SweepPoint};
use crate::scores;

pub fn build_report(ctx: &Ctx) -> Result<LymeDxV1> {
    let summary = ctx.scores.as_ref().context("scores missing")?;
    let chart = ctx.chart.as_ref().context("chart table missing")?;

    let scores = Scores {
        counts: counts_v1(&summary.counts),
        sensitivity: summary.sensitivity,
        specificity: summary.specificity,
        sensitivity_display: scores::format_percent(summary.sensitivity),
        specificity_display: scores::format_percent(summary.specificity),
    };

    let chart = chart
        .rows
        .iter()
        .map(|r| ChartRow {
            label: r.label.as_str().to_string(),
            sample_group: r.sample_group.clone(),
            count: r.count as u64,
        })
        .collect();

    let sweep = ctx
        .sweep_points
        .iter()
        .map(|p| SweepPoint {
            min_antigens: p.min_count,
            counts: counts_v1(&p.counts),
            sensitivity: p.sensitivity,
            specificity: p.specificity,
        })
        .collect();

    Ok(LymeDxV1 {
        tool: "kira-lymedx".to_string(),
        version: ctx.report.version.clone(),
        schema_version: "v1".to_string(),
        params: ctx.params.to_schema(),
        input_meta: ctx.report.input_meta.clone(),
        scores: Some(scores),
        chart,
        sweep,
        warnings: ctx.warnings.clone(),
    })
}

pub fn write_json(path: &Path, report: &LymeDxV1) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

fn counts_v1(counts: &scores::ConfusionCounts) -> ConfusionCounts {
    ConfusionCounts {
        true_positive: counts.true_positive as u64,
        true_negative: counts.true_negative as u64,
        false_negative: counts.false_negative as u64,
        false_positive: counts.false_positive as u64,
        inconclusive: counts.inconclusive as u64,
    }
}
