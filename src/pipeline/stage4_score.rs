use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::scores::{chart_table, format_percent, score};

pub struct Stage4Score;

impl Stage4Score {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Score {
    fn name(&self) -> &'static str {
        "stage4_score"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let summary = score(&ctx.classified);
        let chart = chart_table(&ctx.classified);

        if summary.sensitivity.is_none() {
            ctx.warnings
                .push("sensitivity undefined: no disease samples with a definite call".to_string());
        }
        if summary.specificity.is_none() {
            ctx.warnings
                .push("specificity undefined: no control samples with a definite call".to_string());
        }

        info!(
            tp = summary.counts.true_positive,
            tn = summary.counts.true_negative,
            fn_ = summary.counts.false_negative,
            fp = summary.counts.false_positive,
            inconclusive = summary.counts.inconclusive,
            sensitivity = %format_percent(summary.sensitivity),
            specificity = %format_percent(summary.specificity),
            "scores_ready"
        );

        ctx.scores = Some(summary);
        ctx.chart = Some(chart);
        Ok(())
    }
}
