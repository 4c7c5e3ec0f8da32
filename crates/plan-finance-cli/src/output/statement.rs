//! Year-by-year statement layout for a historical report: whole-unit amounts
//! with space-grouped thousands and colour-coded tiers.

use std::str::FromStr;

use colored::{ColoredString, Colorize};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

const LABEL_WIDTH: usize = 34;
const COLUMN_WIDTH: usize = 16;

const SECTIONS: [(&str, &str, &[(&str, &str)]); 3] = [
    (
        "INCOME STATEMENT",
        "aggregates",
        &[
            ("value_added", "Value added"),
            ("operating_result", "Operating result"),
            ("net_result", "Net result"),
        ],
    ),
    (
        "BALANCE SHEET",
        "aggregates",
        &[
            ("fixed_assets_total", "Fixed assets"),
            ("current_assets_total", "Current assets (excl. cash)"),
            ("total_assets", "Total assets"),
            ("equity_total", "Equity"),
            ("current_liabilities_total", "Current liabilities"),
            ("total_liabilities_and_equity", "Total liabilities and equity"),
        ],
    ),
    (
        "FUNDING STRUCTURE",
        "working_capital",
        &[
            ("working_capital", "Working capital"),
            ("operating_capital_requirement", "Operating capital requirement"),
            ("net_cash_position", "Net cash position"),
        ],
    ),
];

/// Print a report envelope as a statement; anything else falls back to the
/// table layout.
pub fn print_statement(value: &Value) {
    match super::report_years(value) {
        Some(years) => print!("{}", render_statement(value, years)),
        None => super::table::print_table(value),
    }
}

fn render_statement(envelope: &Value, years: &[Value]) -> String {
    let mut out = String::new();
    let result = &envelope["result"];

    out.push_str(&format!(
        "{} {}  ({}-{}, thresholds {})\n\n",
        "Project".bold(),
        text(&result["project_id"]).bold(),
        text(&result["period_start_year"]),
        text(&result["period_end_year"]),
        text(&result["threshold_table_version"]),
    ));

    out.push_str(&format!("{:<LABEL_WIDTH$}", ""));
    for y in years {
        out.push_str(&format!("{:>COLUMN_WIDTH$}", text(&y["year"])));
    }
    out.push('\n');

    for (title, section, rows) in SECTIONS {
        out.push_str(&format!("{}\n", title.bold()));
        for (key, label) in rows {
            out.push_str(&format!("  {:<width$}", label, width = LABEL_WIDTH - 2));
            for y in years {
                let cell = amount(&y[section][*key]).unwrap_or_else(|| "-".to_string());
                out.push_str(&format!("{:>COLUMN_WIDTH$}", cell));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!("{}\n", "DECISION RATIOS".bold()));
    let ratio_rows = years
        .first()
        .and_then(|y| y["ratios"].as_array())
        .map(Vec::len)
        .unwrap_or(0);
    for i in 0..ratio_rows {
        let first = &years[0]["ratios"][i];
        let label = format!("{} ({})", text(&first["label"]), text(&first["unit"]));
        out.push_str(&format!("  {:<width$}", label, width = LABEL_WIDTH - 2));
        for y in years {
            let r = &y["ratios"][i];
            let cell = ratio_value(&r["value"]);
            out.push_str(&format!("{:>COLUMN_WIDTH$}", cell));
        }
        out.push('\n');

        out.push_str(&format!("  {:<width$}", "", width = LABEL_WIDTH - 2));
        for y in years {
            let tier = y["ratios"][i]["tier"].as_str().unwrap_or("undefined");
            let padded = format!("{:>COLUMN_WIDTH$}", tier_label(tier));
            out.push_str(&format!("{}", colour_tier(tier, padded)));
        }
        out.push('\n');
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str(&format!("\n{}\n", "Data quality".bold()));
            for w in warnings.iter().filter_map(Value::as_str) {
                out.push_str(&format!("  {} {}\n", "!".yellow(), w));
            }
        }
    }
    out
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn amount(value: &Value) -> Option<String> {
    decimal(value).map(group_thousands)
}

fn ratio_value(value: &Value) -> String {
    match decimal(value) {
        Some(d) => d
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_string(),
        None => "n/a".to_string(),
    }
}

/// Round to whole units and group thousands with spaces: `-1 234 567`.
pub fn group_thousands(value: Decimal) -> String {
    let whole = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = whole.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    if whole.is_sign_negative() && !whole.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn tier_label(tier: &str) -> &'static str {
    match tier {
        "excellent" => "Excellent",
        "good" => "Good",
        "acceptable" => "Acceptable",
        "problematic" => "Problematic",
        _ => "Not computable",
    }
}

fn colour_tier(tier: &str, cell: String) -> ColoredString {
    match tier {
        "excellent" => cell.green().bold(),
        "good" => cell.green(),
        "acceptable" => cell.yellow(),
        "problematic" => cell.red().bold(),
        _ => cell.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(dec!(0)), "0");
        assert_eq!(group_thousands(dec!(999)), "999");
        assert_eq!(group_thousands(dec!(1000)), "1 000");
        assert_eq!(group_thousands(dec!(21_600_000)), "21 600 000");
        assert_eq!(group_thousands(dec!(-1234567.5)), "-1 234 568");
        assert_eq!(group_thousands(dec!(-0.4)), "0");
        assert_eq!(group_thousands(dec!(1_999.49)), "1 999");
    }

    #[test]
    fn test_ratio_value_rounds_to_two_places() {
        assert_eq!(ratio_value(&json!("57.142857")), "57.14");
        assert_eq!(ratio_value(&Value::Null), "n/a");
    }

    #[test]
    fn test_statement_lists_sections_and_tiers() {
        colored::control::set_override(false);
        let envelope = json!({
            "result": {
                "project_id": "boulangerie",
                "period_start_year": 2023,
                "period_end_year": 2023,
                "threshold_table_version": "2024.1",
                "years": [{
                    "year": 2023,
                    "aggregates": {"value_added": "21600000", "net_result": "-150000.4"},
                    "working_capital": {"net_cash_position": "1800000"},
                    "ratios": [
                        {"label": "Current liquidity", "unit": "x", "value": "2", "tier": "excellent"},
                        {"label": "Solvency", "unit": "%", "value": null, "tier": "undefined"}
                    ]
                }]
            },
            "warnings": ["2023: ratio solvency is not computable"]
        });
        let years = envelope["result"]["years"].as_array().unwrap().clone();
        let out = render_statement(&envelope, &years);

        assert!(out.contains("INCOME STATEMENT"));
        assert!(out.contains("21 600 000"));
        assert!(out.contains("-150 000"));
        assert!(out.contains("1 800 000"));
        assert!(out.contains("Current liquidity (x)"));
        assert!(out.contains("Excellent"));
        assert!(out.contains("Not computable"));
        assert!(out.contains("Data quality"));
    }
}
