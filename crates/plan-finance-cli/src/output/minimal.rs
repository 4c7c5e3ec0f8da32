use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    if let Some(years) = super::report_years(value) {
        for year in years {
            println!("{}", year_tiers(year));
        }
        return;
    }

    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = ["tier", "version", "project_id"];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

/// `2023 financial_autonomy=excellent solvency=undefined ...`
fn year_tiers(year: &Value) -> String {
    let mut line = format_minimal(&year["year"]);
    if let Some(Value::Array(ratios)) = year.get("ratios") {
        for r in ratios {
            line.push_str(&format!(
                " {}={}",
                format_minimal(&r["ratio"]),
                format_minimal(&r["tier"])
            ));
        }
    }
    line
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
