use anyhow::Result;
use tracing::info;

use crate::classify::{TestSelector, classify, classify_external};
use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage3Classify;

impl Stage3Classify {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Classify {
    fn name(&self) -> &'static str {
        "stage3_classify"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let test = ctx.params.test;
        // External tests never read the antigen subset, thresholds or minimum count.
        let (rule, classified) = match test {
            TestSelector::Rule => {
                let rule = ctx.params.build_rule()?;
                let classified = classify(&ctx.joined, &rule, test);
                (Some(rule), classified)
            }
            external => (None, classify_external(&ctx.joined, external)?),
        };

        info!(
            samples = classified.len(),
            test = test.id(),
            min_antigens = rule.as_ref().map(|r| r.min_count),
            antigens = rule.as_ref().map(|r| r.antigens.len()),
            "samples_classified"
        );

        ctx.classified = classified;
        ctx.rule = rule;
        Ok(())
    }
}
