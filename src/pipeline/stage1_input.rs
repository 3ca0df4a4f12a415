use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{lab_table, reference_table};
use crate::pipeline::Stage;

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let lab = lab_table::read_lab_table(&ctx.input.lab)
            .with_context(|| format!("failed to load lab table {}", ctx.input.lab.display()))?;
        let reference = reference_table::read_reference_table(
            &ctx.input.reference,
            ctx.input.reference_skip_rows,
        )
        .with_context(|| {
            format!(
                "failed to load reference table {}",
                ctx.input.reference.display()
            )
        })?;

        info!(
            lab_rows = lab.rows.len(),
            reference_rows = reference.rows.len(),
            "input_loaded"
        );

        if lab.empty_measurements > 0 {
            ctx.warnings.push(format!(
                "{} empty antigen measurement(s) in lab table treated as below threshold",
                lab.empty_measurements
            ));
        }

        ctx.report.input_meta.lab_rows = Some(lab.rows.len() as u64);
        ctx.report.input_meta.reference_rows = Some(reference.rows.len() as u64);
        ctx.lab = Some(lab);
        ctx.reference = Some(reference);
        Ok(())
    }
}
