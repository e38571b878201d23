mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::grading::{GradePromptArgs, ParseGradeArgs};
use commands::simulation::{ApplyArgs, ScenarioArgs};
use commands::valuation::DcfArgs;

/// Linked three-statement event simulator
#[derive(Parser)]
#[command(
    name = "finsim",
    version,
    about = "Linked three-statement event simulator",
    long_about = "A CLI for applying accounting events to a linked income statement, \
                  balance sheet and cash flow statement with decimal precision. \
                  Shows which lines move, why they move, and whether the balance \
                  sheet still balances."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log every applied event to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog of supported events
    Events,
    /// Print the fixed starting snapshot
    Baseline,
    /// Apply one event and show the before/after deltas
    Apply(ApplyArgs),
    /// Replay a sequence of events from JSON
    Scenario(ScenarioArgs),
    /// Build the system and user prompts for grading an essay answer
    GradePrompt(GradePromptArgs),
    /// Turn a grader's raw reply into a structured grade
    ParseGrade(ParseGradeArgs),
    /// Value a business with a five-year unlevered FCF DCF
    Dcf(DcfArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("FINSIM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Logs go to stderr so piped output stays parseable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Events => commands::simulation::run_events(),
        Commands::Baseline => commands::simulation::run_baseline(),
        Commands::Apply(args) => commands::simulation::run_apply(args),
        Commands::Scenario(args) => commands::simulation::run_scenario(args),
        Commands::GradePrompt(args) => commands::grading::run_grade_prompt(args),
        Commands::ParseGrade(args) => commands::grading::run_parse_grade(args),
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::Version => {
            println!("finsim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
