//! Historical financial statements and bank decision ratios.
//!
//! Raw series → aggregates → working capital → ratios → tiers. All arithmetic
//! uses `rust_decimal::Decimal`. No `f64`.

pub mod aggregates;
pub mod ratios;
pub mod recalc;
pub mod report;
pub mod series;
pub mod thresholds;
pub mod working_capital;

pub use aggregates::{compute_aggregates, YearAggregates};
pub use ratios::{compute_ratios, DecisionRatiosYear, RatioKind};
pub use recalc::{recalculate_all, DataQualityWarning};
pub use report::{build_report, HistoricalReport};
pub use series::{
    initialize, initialize_for_project, BalanceSheetAssetsYear, BalanceSheetLiabilitiesYear,
    HistoricalFinancialAnalysis, IncomeStatementYear, StatementField, StatementKind,
};
pub use thresholds::{evaluate, evaluate_kind, Tier, THRESHOLD_TABLE};
pub use working_capital::{analyze_working_capital, WorkingCapitalYear};
