use chrono::{Datelike, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use plan_finance_core::historical::{self, HistoricalFinancialAnalysis, StatementKind};
use plan_finance_core::storage::AnalysisStore;

use crate::input;
use crate::settings::Settings;
use crate::store::JsonDirStore;

/// Arguments for seeding a new analysis
#[derive(Args)]
pub struct InitArgs {
    /// Project identifier (also the file name under the store directory)
    #[arg(long)]
    pub project: String,

    /// Owner identifier
    #[arg(long, default_value = "")]
    pub owner: String,

    /// Reference year; the analysis covers the three following fiscal years
    /// (defaults to the current calendar year)
    #[arg(long)]
    pub current_year: Option<i32>,

    /// First fiscal year, for a custom period (requires --years)
    #[arg(long, conflicts_with = "current_year", requires = "years")]
    pub start_year: Option<i32>,

    /// Number of fiscal years, for a custom period
    #[arg(long, requires = "start_year")]
    pub years: Option<usize>,
}

/// Arguments for editing raw statement amounts
#[derive(Args)]
pub struct SetFieldArgs {
    /// Project identifier
    #[arg(long)]
    pub project: String,

    /// Path to a JSON/YAML list of edits (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Fiscal year to edit
    #[arg(long)]
    pub year: Option<i32>,

    /// Statement: income_statement, assets or liabilities
    #[arg(long)]
    pub statement: Option<String>,

    /// Field name, e.g. revenue or tradeReceivables
    #[arg(long)]
    pub field: Option<String>,

    /// Amount (non-negative)
    #[arg(long)]
    pub value: Option<Decimal>,

    /// Recalculate before saving
    #[arg(long)]
    pub recalculate: bool,
}

/// Arguments for commands that act on a stored project
#[derive(Args)]
pub struct ProjectArgs {
    /// Project identifier
    #[arg(long)]
    pub project: String,
}

/// Arguments for building a historical report
#[derive(Args)]
pub struct ReportArgs {
    /// Project identifier (read from the store)
    #[arg(long, conflicts_with = "input")]
    pub project: Option<String>,

    /// Path to an analysis document (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,
}

/// One raw amount to write.
#[derive(Debug, Deserialize)]
pub struct FieldEdit {
    pub year: i32,
    pub statement: String,
    pub field: String,
    pub value: Decimal,
}

fn load_existing(
    store: &JsonDirStore,
    project: &str,
) -> Result<HistoricalFinancialAnalysis, Box<dyn std::error::Error>> {
    store
        .load(project)?
        .ok_or_else(|| format!("No analysis for project '{project}'; run `bpf init` first").into())
}

pub fn run_init(args: InitArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store = JsonDirStore::new(&settings.store.dir);
    if store.load(&args.project)?.is_some() {
        return Err(format!("Project '{}' already has an analysis", args.project).into());
    }

    let analysis = match (args.start_year, args.years) {
        (Some(start_year), Some(years)) => {
            let mut a = historical::initialize(years, start_year)?;
            a.project_id = args.project.clone();
            a.owner_id = args.owner.clone();
            a
        }
        _ => {
            let current_year = args.current_year.unwrap_or_else(|| Utc::now().year());
            historical::initialize_for_project(&args.project, &args.owner, current_year)?
        }
    };

    let version = store.save(&args.project, &analysis)?;
    tracing::info!(project = %args.project, version, "analysis created");

    Ok(json!({
        "project_id": analysis.project_id,
        "owner_id": analysis.owner_id,
        "years": analysis.years(),
        "version": version,
    }))
}

pub fn run_set_field(
    args: SetFieldArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let edits: Vec<FieldEdit> = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        vec![FieldEdit {
            year: args.year.ok_or("--year is required (or provide --input)")?,
            statement: args
                .statement
                .ok_or("--statement is required (or provide --input)")?,
            field: args.field.ok_or("--field is required (or provide --input)")?,
            value: args.value.ok_or("--value is required (or provide --input)")?,
        }]
    };
    if edits.is_empty() {
        return Err("No edits supplied".into());
    }

    let mut store = JsonDirStore::new(&settings.store.dir);
    let mut analysis = load_existing(&store, &args.project)?;

    // All edits apply or none are saved.
    for edit in &edits {
        let kind: StatementKind = edit.statement.parse()?;
        analysis.set_field(edit.year, kind, &edit.field, edit.value)?;
    }

    if args.recalculate {
        analysis = historical::recalculate_all(&analysis, Utc::now(), &settings.engine)?;
    }
    let version = store.save(&args.project, &analysis)?;

    Ok(json!({
        "project_id": args.project,
        "edits_applied": edits.len(),
        "stale_years": analysis.stale_years,
        "recalculated": args.recalculate,
        "version": version,
    }))
}

pub fn run_recalculate(
    args: ProjectArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store = JsonDirStore::new(&settings.store.dir);
    let analysis = load_existing(&store, &args.project)?;

    let recalculated = historical::recalculate_all(&analysis, Utc::now(), &settings.engine)?;
    let version = store.save(&args.project, &recalculated)?;

    let warnings: Vec<String> = recalculated.warnings.iter().map(|w| w.to_string()).collect();
    Ok(json!({
        "project_id": args.project,
        "years": recalculated.years(),
        "recalculated_at": recalculated.last_recalculated_at,
        "version": version,
        "warnings": warnings,
    }))
}

pub fn run_report(args: ReportArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis: HistoricalFinancialAnalysis = if let Some(ref project) = args.project {
        load_existing(&JsonDirStore::new(&settings.store.dir), project)?
    } else if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--project, --input <file> or stdin required for report".into());
    };

    let mut report = historical::build_report(&analysis, &settings.engine)?;
    if !analysis.stale_years.is_empty() {
        let years: Vec<String> = analysis.stale_years.iter().map(|y| y.to_string()).collect();
        report.warnings.insert(
            0,
            format!(
                "Stored figures for {} were edited after the last recalculation; \
                 report recomputed from raw statements",
                years.join(", ")
            ),
        );
    }
    Ok(serde_json::to_value(report)?)
}
