use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use plan_finance_core::historical::thresholds::{self, RatioThresholds, Tier, THRESHOLD_TABLE};
use plan_finance_core::historical::RatioKind;

/// Arguments for classifying a single ratio value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EvaluateArgs {
    /// Ratio name, e.g. financial_autonomy or currentLiquidity
    #[arg(long)]
    pub ratio: String,

    /// Computed value; omit for a ratio that could not be computed
    #[arg(long)]
    pub value: Option<Decimal>,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let kind: RatioKind = args.ratio.parse()?;
    let tier = thresholds::evaluate_kind(kind, args.value);

    Ok(json!({
        "ratio": kind.key(),
        "value": args.value,
        "unit": kind.unit(),
        "tier": tier,
        "tier_label": tier.label(),
        "threshold_table_version": THRESHOLD_TABLE.version,
    }))
}

fn describe_bound(thresholds: &RatioThresholds, tier: Tier) -> String {
    thresholds
        .bounds
        .iter()
        .find(|b| b.tier == tier)
        .map(|b| format!("{} {}", b.comparison.symbol(), b.cut))
        .unwrap_or_default()
}

/// One row per ratio with its cut points, best tier first.
pub fn run_thresholds() -> Result<Value, Box<dyn std::error::Error>> {
    let rows: Vec<Value> = THRESHOLD_TABLE
        .ratios
        .iter()
        .map(|t| {
            json!({
                "ratio": t.ratio.key(),
                "unit": t.ratio.unit(),
                "direction": t.direction,
                "excellent": describe_bound(t, Tier::Excellent),
                "good": describe_bound(t, Tier::Good),
                "acceptable": describe_bound(t, Tier::Acceptable),
                "problematic": "otherwise",
                "version": THRESHOLD_TABLE.version,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}
