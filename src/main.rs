use std::io::{BufRead, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kira_lymedx::cli::{
    Cli, Commands, InputArgs, PanelCommand, PanelShowArgs, RuleArgs, RunArgs,
};
use kira_lymedx::ctx::{Ctx, InputPaths, RunParams};
use kira_lymedx::io;
use kira_lymedx::panel::{self, ANTIGEN_PANEL};
use kira_lymedx::pipeline::Pipeline;
use kira_lymedx::pipeline::stage0_scaffold::Stage0Scaffold;
use kira_lymedx::pipeline::stage1_input::Stage1Input;
use kira_lymedx::pipeline::stage2_join::Stage2Join;
use kira_lymedx::pipeline::stage3_classify::Stage3Classify;
use kira_lymedx::pipeline::stage4_score::Stage4Score;
use kira_lymedx::pipeline::stage5_sweep::Stage5Sweep;
use kira_lymedx::pipeline::stage6_output::Stage6Output;
use kira_lymedx::session::Session;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let ctx = run_pipeline(args, false)?;
            print_summary(&ctx)?;
        }
        Commands::Sweep(args) => {
            let ctx = run_pipeline(args, true)?;
            print_summary(&ctx)?;
        }
        Commands::Interactive(args) => {
            let input = input_paths(&args.input);
            let params = build_params(&args.rule)?;
            run_interactive(Session::new(input, params))?;
        }
        Commands::Validate(args) => {
            let mut ctx = Ctx::new(
                input_paths(&args.input),
                std::path::PathBuf::from("."),
                RunParams::builtin()?,
                false,
                false,
                env!("CARGO_PKG_VERSION"),
            );
            let pipeline = Pipeline::new(vec![
                Box::new(Stage1Input::new()),
                Box::new(Stage2Join::new()),
            ]);
            pipeline.run(&mut ctx)?;
            print_validate_summary(&ctx);
        }
        Commands::Panel(args) => match args.command {
            PanelCommand::Show(show) => handle_panel_show(show)?,
        },
    }

    Ok(())
}

fn input_paths(args: &InputArgs) -> InputPaths {
    let mut input = InputPaths::new(args.lab.clone(), args.reference.clone());
    input.reference_skip_rows = args.reference_skip_rows;
    input
}

fn build_params(args: &RuleArgs) -> Result<RunParams> {
    let mut params = RunParams::builtin()?;
    if let Some(path) = &args.thresholds {
        let user_defs = panel::load_user(path)?;
        params.thresholds.defs = panel::merge_defs(params.thresholds.defs, user_defs);
    }
    for raw in &args.threshold {
        let def = panel::parse_assignment(raw)?;
        params.thresholds.set(&def.antigen, def.threshold)?;
    }
    if !args.antigens.is_empty() {
        // `--antigens ""` selects an empty subset.
        let names: Vec<&str> = args
            .antigens
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        params.antigens = panel::resolve_antigens(&names)?;
    }
    params.test = args.test.into();
    params.min_count = args.min_antigens;
    params.comparison = args.count_rule.into();
    Ok(params)
}

fn run_pipeline(args: RunArgs, sweep: bool) -> Result<Ctx> {
    let params = build_params(&args.rule)?;
    let mut ctx = Ctx::new(
        input_paths(&args.input),
        args.out,
        params,
        args.json,
        args.tsv,
        env!("CARGO_PKG_VERSION"),
    );
    ctx.sweep = sweep;

    let pipeline = Pipeline::new(vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Input::new()),
        Box::new(Stage2Join::new()),
        Box::new(Stage3Classify::new()),
        Box::new(Stage4Score::new()),
        Box::new(Stage5Sweep::new()),
        Box::new(Stage6Output::new()),
    ]);
    pipeline.run(&mut ctx)?;
    Ok(ctx)
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    print_warnings(&ctx.warnings);
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    if !warnings.is_empty() {
        println!("warnings:");
        for warning in warnings {
            println!("- {}", warning);
        }
    }
}

fn print_validate_summary(ctx: &Ctx) {
    println!("kira-lymedx validate ok");
    if let Some(stats) = &ctx.join_stats {
        println!("lab rows: {}", stats.lab_rows);
        println!("reference rows: {}", stats.reference_rows);
        println!("joined: {}", stats.joined);
    }
    print_warnings(&ctx.warnings);
}

fn handle_panel_show(args: PanelShowArgs) -> Result<()> {
    let mut thresholds = panel::load_builtin()?;
    if let Some(path) = args.thresholds {
        let user_defs = panel::load_user(&path)?;
        thresholds.defs = panel::merge_defs(thresholds.defs, user_defs);
    }
    println!("antigen panel (version {}):", thresholds.version);
    for antigen in ANTIGEN_PANEL {
        match thresholds.get(antigen) {
            Some(t) => println!("{}\t{}", antigen, t),
            None => println!("{}\t-", antigen),
        }
    }
    Ok(())
}

fn run_interactive(mut session: Session) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    report_recompute(&mut session);
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.trim();
        match command {
            "" => {}
            "quit" | "exit" => break,
            "show" => show_session(&session),
            _ => match session.apply(command) {
                Ok(()) => report_recompute(&mut session),
                Err(err) => println!("error: {:#}", err),
            },
        }
        print!("> ");
        stdout.flush()?;
    }
    println!();
    Ok(())
}

fn report_recompute(session: &mut Session) {
    if session.recompute().is_err() {
        println!("error: {}", session.last_error().unwrap_or("recomputation failed"));
        if session.last().is_some() {
            println!("showing last valid result:");
        }
    }
    show_session(session);
}

fn show_session(session: &Session) {
    match session.last() {
        Some(outcome) => {
            print!("{}", outcome.summary);
            print_warnings(&outcome.warnings);
        }
        None => println!("no valid result yet"),
    }
}
