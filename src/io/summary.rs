use anyhow::{Context, Result};

use crate::classify::{ConfusionLabel, TestSelector};
use crate::ctx::Ctx;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let meta = &ctx.report.input_meta;
    let summary = ctx.scores.as_ref().context("scores missing")?;
    let params = &ctx.params;

    let mut out = String::new();
    out.push_str(&format!("kira-lymedx v{}\n", version));
    out.push_str(&format!(
        "Input: {} lab rows, {} reference rows, {} joined\n",
        meta.lab_rows.unwrap_or(0),
        meta.reference_rows.unwrap_or(0),
        meta.joined_rows.unwrap_or(0)
    ));
    let antigens = if params.antigens.is_empty() {
        "no antigens".to_string()
    } else {
        params.antigens.join(",")
    };
    match params.test {
        TestSelector::Rule => out.push_str(&format!(
            "Test: {} (positive when antigens above threshold {} {} of {})\n",
            params.test.label(),
            params.comparison.symbol(),
            params.min_count,
            antigens
        )),
        other => out.push_str(&format!("Test: {}\n", other.label())),
    }
    for label in ConfusionLabel::ALL {
        out.push_str(&format!("{}: {}\n", label, summary.counts.get(label)));
    }
    out.push_str(&summary.sensitivity_line());
    out.push('\n');
    out.push_str(&summary.specificity_line());
    out.push('\n');

    if !ctx.sweep_points.is_empty() {
        out.push_str("Sweep (min antigens: sensitivity / specificity):\n");
        for p in &ctx.sweep_points {
            out.push_str(&format!(
                "  {:>2}: {} / {}\n",
                p.min_count,
                crate::scores::format_percent(p.sensitivity),
                crate::scores::format_percent(p.specificity)
            ));
        }
    }

    Ok(out)
}
