use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::scores::sweep_min_count;

pub struct Stage5Sweep;

impl Stage5Sweep {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Sweep {
    fn name(&self) -> &'static str {
        "stage5_sweep"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if !ctx.sweep {
            return Ok(());
        }
        // The sweep always scores the lab rule, even when another test was selected.
        let rule = match &ctx.rule {
            Some(rule) => rule.clone(),
            None => ctx.params.build_rule()?,
        };
        if rule.antigens.is_empty() {
            warn!("sweep skipped: no antigens included");
            ctx.warnings
                .push("sweep skipped: no antigens included in the lab rule".to_string());
            return Ok(());
        }
        let points = sweep_min_count(&ctx.joined, &rule);
        info!(points = points.len(), "sweep_ready");
        ctx.sweep_points = points;
        Ok(())
    }
}
