pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod statement;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
        OutputFormat::Statement => statement::print_statement(value),
    }
}

/// The per-year entries of a historical report envelope, if `value` is one.
pub fn report_years(value: &Value) -> Option<&Vec<Value>> {
    value.get("result")?.get("years")?.as_array()
}

/// Flatten one report year into ordered (column, value) pairs: aggregates,
/// working capital, then each ratio's value and tier.
pub fn flatten_year(year: &Value) -> Vec<(String, Value)> {
    let mut cols = vec![("year".to_string(), year["year"].clone())];
    for section in ["aggregates", "working_capital"] {
        if let Some(Value::Object(map)) = year.get(section) {
            cols.extend(
                map.iter()
                    .filter(|(k, _)| k.as_str() != "year")
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
        }
    }
    if let Some(Value::Array(ratios)) = year.get("ratios") {
        for r in ratios {
            let name = r["ratio"].as_str().unwrap_or_default();
            cols.push((name.to_string(), r["value"].clone()));
            cols.push((format!("{name}_tier"), r["tier"].clone()));
        }
    }
    cols.push(("balanced".to_string(), year["balanced"].clone()));
    cols
}
