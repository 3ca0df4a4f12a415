//! Recompute-on-change driver.
//!
//! A `Session` keeps the input paths and the current parameters. Every
//! recomputation runs the whole pipeline on a fresh `Ctx`; a failed run leaves
//! the last valid outcome in place and records the error instead.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::classify::{CountComparison, TestSelector};
use crate::ctx::{Ctx, InputPaths, RunParams};
use crate::io::summary::format_summary;
use crate::panel;
use crate::pipeline::Pipeline;
use crate::pipeline::stage1_input::Stage1Input;
use crate::pipeline::stage2_join::Stage2Join;
use crate::pipeline::stage3_classify::Stage3Classify;
use crate::pipeline::stage4_score::Stage4Score;
use crate::pipeline::stage6_output::Stage6Output;
use crate::schema::v1::LymeDxV1;
use crate::scores::{ChartTable, ScoreSummary};

#[derive(Debug, Clone)]
pub struct Outcome {
    pub summary: String,
    pub scores: ScoreSummary,
    pub chart: ChartTable,
    pub report: LymeDxV1,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct Session {
    input: InputPaths,
    params: RunParams,
    last: Option<Outcome>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(input: InputPaths, params: RunParams) -> Self {
        Self {
            input,
            params,
            last: None,
            last_error: None,
        }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Last successfully computed outcome, if any.
    pub fn last(&self) -> Option<&Outcome> {
        self.last.as_ref()
    }

    /// Error from the most recent recomputation; cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Applies one parameter change. Parameters are left untouched when the
    /// command itself cannot be parsed.
    ///
    /// Commands: `test <id>`, `min <n>`, `antigens <a,b,..|all|none>`,
    /// `threshold <antigen> <value>`, `count-rule <at-least|greater>`.
    pub fn apply(&mut self, command: &str) -> Result<()> {
        let mut parts = command.split_whitespace();
        let verb = parts.next().context("empty command")?;
        let args: Vec<&str> = parts.collect();
        let mut next = self.params.clone();

        match (verb, args.as_slice()) {
            ("test", [id]) => next.test = TestSelector::parse(id)?,
            ("min", [n]) => {
                next.min_count = n
                    .parse()
                    .with_context(|| format!("invalid minimum antigen count '{}'", n))?
            }
            ("antigens", ["all"]) => next.antigens = panel::full_panel(),
            ("antigens", ["none"]) => next.antigens.clear(),
            ("antigens", [list]) => {
                let names: Vec<&str> = list.split(',').filter(|s| !s.is_empty()).collect();
                next.antigens = panel::resolve_antigens(&names)?;
            }
            ("threshold", [antigen, value]) => {
                let def = panel::parse_assignment(&format!("{}={}", antigen, value))?;
                next.thresholds.set(&def.antigen, def.threshold)?;
            }
            ("count-rule", [id]) => next.comparison = CountComparison::parse(id)?,
            _ => bail!("unrecognized command '{}'", command.trim()),
        }

        self.params = next;
        Ok(())
    }

    pub fn recompute(&mut self) -> Result<&Outcome> {
        match run_once(&self.input, &self.params) {
            Ok(outcome) => {
                self.last_error = None;
                Ok(&*self.last.insert(outcome))
            }
            Err(err) => {
                let message = format!("{:#}", err);
                warn!(error = %message, "recomputation failed; keeping last valid result");
                self.last_error = Some(message);
                Err(err)
            }
        }
    }
}

/// Runs load, join, classify and score once without touching the filesystem
/// beyond reading the inputs.
pub fn run_once(input: &InputPaths, params: &RunParams) -> Result<Outcome> {
    let mut ctx = Ctx::new(
        input.clone(),
        PathBuf::from("."),
        params.clone(),
        false,
        false,
        env!("CARGO_PKG_VERSION"),
    );
    let pipeline = Pipeline::new(vec![
        Box::new(Stage1Input::new()),
        Box::new(Stage2Join::new()),
        Box::new(Stage3Classify::new()),
        Box::new(Stage4Score::new()),
        Box::new(Stage6Output::new()),
    ]);
    pipeline.run(&mut ctx)?;

    let summary = format_summary(&ctx)?;
    Ok(Outcome {
        summary,
        scores: ctx.scores.context("scores missing")?,
        chart: ctx.chart.context("chart table missing")?,
        report: ctx.report,
        warnings: ctx.warnings,
    })
}
