use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::classify::{
    CountComparison, DEFAULT_COUNT_COMPARISON, DEFAULT_MIN_COUNT, TestSelector,
};
use crate::io::reference_table::DEFAULT_SKIP_ROWS;

#[derive(Debug, Parser)]
#[command(
    name = "kira-lymedx",
    version,
    about = "Score a Lyme antigen panel rule against CDC reference diagnoses"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify all joined samples once and report sensitivity/specificity
    Run(RunArgs),
    /// Score the lab rule for every minimum antigen count
    Sweep(RunArgs),
    /// Read parameter changes from stdin and recompute after each one
    Interactive(InteractiveArgs),
    /// Load and join the inputs without scoring
    Validate(ValidateArgs),
    /// Inspect the antigen panel
    Panel(PanelArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    #[arg(long, help = "Lab antigen measurement CSV (.csv or .csv.gz)")]
    pub lab: PathBuf,

    #[arg(long, help = "CDC reference diagnosis CSV (.csv or .csv.gz)")]
    pub reference: PathBuf,

    #[arg(
        long,
        default_value_t = DEFAULT_SKIP_ROWS,
        help = "Lines above the header row in the reference CSV"
    )]
    pub reference_skip_rows: usize,
}

#[derive(Debug, Args)]
pub struct RuleArgs {
    #[arg(long, value_enum, default_value_t = TestArg::Rule)]
    pub test: TestArg,

    #[arg(
        long,
        default_value_t = DEFAULT_MIN_COUNT,
        help = "Minimum number of antigens above threshold for a positive call (1-12)"
    )]
    pub min_antigens: usize,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Antigens included in the rule (default: full panel)"
    )]
    pub antigens: Vec<String>,

    #[arg(
        long,
        help = "Threshold TSV (antigen<TAB>threshold) to overlay on built-in values"
    )]
    pub thresholds: Option<PathBuf>,

    #[arg(
        long = "threshold",
        value_name = "ANTIGEN=VALUE",
        help = "Per-antigen threshold override (repeatable)"
    )]
    pub threshold: Vec<String>,

    #[arg(
        long,
        value_enum,
        default_value_t = CountRuleArg::from(DEFAULT_COUNT_COMPARISON),
        help = "How the antigen count is compared to --min-antigens"
    )]
    pub count_rule: CountRuleArg,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub rule: RuleArgs,

    #[arg(long, default_value = ".", help = "Output directory for --json/--tsv")]
    pub out: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,
}

#[derive(Debug, Args)]
pub struct InteractiveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub rule: RuleArgs,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct PanelArgs {
    #[command(subcommand)]
    pub command: PanelCommand,
}

#[derive(Debug, Subcommand)]
pub enum PanelCommand {
    /// Print the antigen panel with effective thresholds
    Show(PanelShowArgs),
}

#[derive(Debug, Args)]
pub struct PanelShowArgs {
    #[arg(long, help = "Optional threshold TSV to overlay on built-in values")]
    pub thresholds: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestArg {
    Rule,
    Ttt,
    Eia,
    IgmWb,
    IggWb,
}

impl From<TestArg> for TestSelector {
    fn from(arg: TestArg) -> Self {
        match arg {
            TestArg::Rule => TestSelector::Rule,
            TestArg::Ttt => TestSelector::TwoTier,
            TestArg::Eia => TestSelector::Eia,
            TestArg::IgmWb => TestSelector::IgmWb,
            TestArg::IggWb => TestSelector::IggWb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CountRuleArg {
    AtLeast,
    Greater,
}

impl From<CountRuleArg> for CountComparison {
    fn from(arg: CountRuleArg) -> Self {
        match arg {
            CountRuleArg::AtLeast => CountComparison::AtLeast,
            CountRuleArg::Greater => CountComparison::Greater,
        }
    }
}

impl From<CountComparison> for CountRuleArg {
    fn from(comparison: CountComparison) -> Self {
        match comparison {
            CountComparison::AtLeast => CountRuleArg::AtLeast,
            CountComparison::Greater => CountRuleArg::Greater,
        }
    }
}
