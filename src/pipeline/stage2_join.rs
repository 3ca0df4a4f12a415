use anyhow::{Context, Result};
use tracing::warn;

use crate::ctx::Ctx;
use crate::join::inner_join;
use crate::pipeline::Stage;

pub struct Stage2Join;

impl Stage2Join {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Join {
    fn name(&self) -> &'static str {
        "stage2_join"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let lab = ctx.lab.as_ref().context("lab table not loaded")?;
        let reference = ctx.reference.as_ref().context("reference table not loaded")?;
        let (joined, stats) = inner_join(lab, reference)?;

        if stats.joined == 0 {
            warn!("join produced no samples");
            ctx.warnings
                .push("no sample keys matched between lab and reference tables".to_string());
        }
        if stats.lab_unmatched > 0 {
            ctx.warnings.push(format!(
                "{} lab sample(s) without a reference row dropped",
                stats.lab_unmatched
            ));
        }
        if stats.reference_unmatched > 0 {
            ctx.warnings.push(format!(
                "{} reference sample(s) without lab measurements dropped",
                stats.reference_unmatched
            ));
        }

        ctx.report.input_meta.joined_rows = Some(stats.joined as u64);
        ctx.report.input_meta.lab_unmatched = Some(stats.lab_unmatched as u64);
        ctx.report.input_meta.reference_unmatched = Some(stats.reference_unmatched as u64);
        ctx.joined = joined;
        ctx.join_stats = Some(stats);
        Ok(())
    }
}
