mod commands;
mod input;
mod output;
mod settings;
mod store;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analysis::{InitArgs, ProjectArgs, ReportArgs, SetFieldArgs};
use commands::ratios::EvaluateArgs;
use settings::Settings;

/// Historical statement analysis for business-plan financing files
#[derive(Parser)]
#[command(
    name = "bpf",
    version,
    about = "Historical statement analysis and bank decision ratios",
    long_about = "A CLI for entering historical income statements and balance sheets, \
                  deriving SYSCOHADA intermediate balances, working capital and the five \
                  bank decision ratios, and classifying each ratio against the threshold \
                  table. All amounts use decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Settings file (TOML, YAML or JSON); defaults to ./bpf.* when present
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a blank analysis for a project
    Init(InitArgs),
    /// Set one or more raw statement amounts
    SetField(SetFieldArgs),
    /// Regenerate working capital, ratios and warnings and save
    Recalculate(ProjectArgs),
    /// Build the historical report with ratio tiers
    Report(ReportArgs),
    /// Classify a single ratio value
    Evaluate(EvaluateArgs),
    /// Show the ratio threshold table
    Thresholds,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
    Statement,
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(format!("bpf={level},plan_finance_core={level}"))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::new(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: invalid settings: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    init_tracing(&settings.log.level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Init(args) => commands::analysis::run_init(args, &settings),
        Commands::SetField(args) => commands::analysis::run_set_field(args, &settings),
        Commands::Recalculate(args) => commands::analysis::run_recalculate(args, &settings),
        Commands::Report(args) => commands::analysis::run_report(args, &settings),
        Commands::Evaluate(args) => commands::ratios::run_evaluate(args),
        Commands::Thresholds => commands::ratios::run_thresholds(),
        Commands::Version => {
            println!("bpf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
