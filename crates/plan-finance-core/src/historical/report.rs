use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::aggregates::YearAggregates;
use super::ratios::RatioKind;
use super::recalc::{derive_all, DataQualityWarning};
use super::thresholds::{Direction, Tier, THRESHOLD_TABLE, THRESHOLD_TABLE_VERSION};
use super::working_capital::WorkingCapitalYear;
use super::HistoricalFinancialAnalysis;
use crate::config::EngineConfig;
use crate::types::{with_metadata, ComputationOutput, FiscalYear};
use crate::PlanFinanceResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One ratio value with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioAssessment {
    pub ratio: RatioKind,
    pub label: String,
    pub unit: String,
    /// `None` when the ratio is not computable
    pub value: Option<Decimal>,
    pub tier: Tier,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearReport {
    pub year: FiscalYear,
    pub aggregates: YearAggregates,
    pub working_capital: WorkingCapitalYear,
    pub ratios: Vec<RatioAssessment>,
    /// False when the year carries a balance mismatch warning
    pub balanced: bool,
}

impl YearReport {
    pub fn assessment(&self, kind: RatioKind) -> Option<&RatioAssessment> {
        self.ratios.iter().find(|r| r.ratio == kind)
    }
}

/// Everything the export layer needs to render the historical section of a
/// financing file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalReport {
    pub project_id: String,
    pub owner_id: String,
    pub period_start_year: FiscalYear,
    pub period_end_year: FiscalYear,
    pub threshold_table_version: String,
    pub years: Vec<YearReport>,
    pub data_quality: Vec<DataQualityWarning>,
}

impl HistoricalReport {
    pub fn year(&self, year: FiscalYear) -> Option<&YearReport> {
        self.years.iter().find(|y| y.year == year)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Recompute every year from the raw records and classify each ratio.
///
/// The stored derived sequences of `analysis` are ignored, so a report built
/// from a stale analysis is still consistent with its raw figures.
pub fn build_report(
    analysis: &HistoricalFinancialAnalysis,
    config: &EngineConfig,
) -> PlanFinanceResult<ComputationOutput<HistoricalReport>> {
    let start = Instant::now();

    config.validate()?;
    analysis.validate()?;

    let derived = derive_all(analysis, config)?;

    let mut years = Vec::with_capacity(derived.len());
    let mut data_quality = Vec::new();
    for d in derived {
        let ratios = RatioKind::ALL
            .into_iter()
            .map(|kind| {
                let thresholds = THRESHOLD_TABLE.for_ratio(kind);
                let value = d.ratios.value(kind);
                RatioAssessment {
                    ratio: kind,
                    label: kind.label().to_string(),
                    unit: kind.unit().to_string(),
                    value,
                    tier: thresholds.classify(value),
                    direction: thresholds.direction,
                }
            })
            .collect();
        let balanced = !d
            .warnings
            .iter()
            .any(|w| matches!(w, DataQualityWarning::BalanceMismatch { .. }));

        years.push(YearReport {
            year: d.aggregates.year,
            aggregates: d.aggregates,
            working_capital: d.working_capital,
            ratios,
            balanced,
        });
        data_quality.extend(d.warnings);
    }

    let warnings: Vec<String> = data_quality.iter().map(|w| w.to_string()).collect();

    let output = HistoricalReport {
        project_id: analysis.project_id.clone(),
        owner_id: analysis.owner_id.clone(),
        period_start_year: analysis.period_start_year,
        period_end_year: analysis.period_end_year,
        threshold_table_version: THRESHOLD_TABLE_VERSION.to_string(),
        years,
        data_quality,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "threshold_table_version": THRESHOLD_TABLE_VERSION,
        "balance_tolerance": config.balance_tolerance,
        "net_income_materiality": config.net_income_materiality,
        "debt_repayment_capacity": "financial_debt / (net_result + depreciation_and_amortization)",
        "solvency": "equity_total / (total_liabilities_and_equity - equity_total)",
        "undefined_when": "denominator <= 0",
    });

    Ok(with_metadata(
        "Historical statement analysis (SYSCOHADA intermediate balances, bank decision ratios)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
