use std::str::FromStr;

use chrono::{DateTime, Utc};
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use plan_finance_core::historical::{self, HistoricalFinancialAnalysis, StatementKind};
use plan_finance_core::EngineConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(EngineConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Analysis lifecycle
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct InitializeInput {
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    owner_id: String,
    /// Seeds the three fiscal years after this one
    current_year: Option<i32>,
    start_year: Option<i32>,
    year_count: Option<usize>,
}

#[derive(Deserialize)]
struct FieldEdit {
    year: i32,
    statement: String,
    field: String,
    value: Decimal,
}

#[napi]
pub fn initialize_analysis(input_json: String) -> NapiResult<String> {
    let input: InitializeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let analysis = match (input.start_year, input.year_count, input.current_year) {
        (Some(start_year), Some(year_count), _) => {
            let mut a = historical::initialize(year_count, start_year).map_err(to_napi_error)?;
            a.project_id = input.project_id;
            a.owner_id = input.owner_id;
            a
        }
        (_, _, Some(current_year)) => {
            historical::initialize_for_project(&input.project_id, &input.owner_id, current_year)
                .map_err(to_napi_error)?
        }
        _ => {
            return Err(napi::Error::from_reason(
                "Provide current_year, or start_year with year_count",
            ))
        }
    };
    serde_json::to_string(&analysis).map_err(to_napi_error)
}

#[napi]
pub fn set_statement_field(analysis_json: String, edit_json: String) -> NapiResult<String> {
    let mut analysis: HistoricalFinancialAnalysis =
        serde_json::from_str(&analysis_json).map_err(to_napi_error)?;
    let edit: FieldEdit = serde_json::from_str(&edit_json).map_err(to_napi_error)?;
    let kind = StatementKind::from_str(&edit.statement).map_err(to_napi_error)?;
    analysis
        .set_field(edit.year, kind, &edit.field, edit.value)
        .map_err(to_napi_error)?;
    serde_json::to_string(&analysis).map_err(to_napi_error)
}

/// `as_of` is an RFC 3339 timestamp recorded as the recalculation time.
#[napi]
pub fn recalculate_analysis(
    analysis_json: String,
    as_of: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let analysis: HistoricalFinancialAnalysis =
        serde_json::from_str(&analysis_json).map_err(to_napi_error)?;
    let as_of: DateTime<Utc> = DateTime::parse_from_rfc3339(&as_of)
        .map_err(to_napi_error)?
        .with_timezone(&Utc);
    let config = parse_config(config_json)?;
    let output =
        historical::recalculate_all(&analysis, as_of, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[napi]
pub fn historical_report(analysis_json: String, config_json: Option<String>) -> NapiResult<String> {
    let analysis: HistoricalFinancialAnalysis =
        serde_json::from_str(&analysis_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = historical::build_report(&analysis, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Returns the tier as a JSON string; omit `value` for a ratio that could
/// not be computed.
#[napi]
pub fn evaluate_ratio(ratio: String, value: Option<String>) -> NapiResult<String> {
    let value = value
        .map(|v| Decimal::from_str(&v))
        .transpose()
        .map_err(to_napi_error)?;
    let tier = historical::evaluate(&ratio, value).map_err(to_napi_error)?;
    serde_json::to_string(&tier).map_err(to_napi_error)
}

#[napi]
pub fn threshold_table() -> NapiResult<String> {
    serde_json::to_string(&historical::THRESHOLD_TABLE).map_err(to_napi_error)
}
