//! Recalculation orchestrator.
//!
//! Runs aggregates, working capital and ratios for every year of a validated
//! series and replaces the derived sequences wholesale. Data-quality
//! conditions (unbalanced sheet, divergent net income, undefined ratios) are
//! collected as warnings and never block the result.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregates::{compute_aggregates, YearAggregates};
use super::ratios::{compute_ratios, DecisionRatiosYear, RatioKind};
use super::series::{HistoricalFinancialAnalysis, YearRecords};
use super::working_capital::{
    analyze_working_capital, cash_reconciliation_gap, WorkingCapitalYear,
};
use crate::config::EngineConfig;
use crate::types::{FiscalYear, Money};
use crate::PlanFinanceResult;

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// Total assets and total liabilities and equity disagree beyond
    /// tolerance, so net cash position does not reconcile to cash less
    /// overdraft either.
    BalanceMismatch {
        year: FiscalYear,
        total_assets: Money,
        total_liabilities_and_equity: Money,
        difference: Money,
        cash_reconciliation_gap: Money,
    },
    /// Net result derived from the income statement differs materially from
    /// the net income entered on the liabilities side.
    NetIncomeDivergence {
        year: FiscalYear,
        computed_net_result: Money,
        reported_net_income: Money,
        difference: Money,
    },
    /// Ratio denominator was zero or negative.
    UndefinedRatio { year: FiscalYear, ratio: RatioKind },
}

impl DataQualityWarning {
    pub fn year(&self) -> FiscalYear {
        match self {
            Self::BalanceMismatch { year, .. }
            | Self::NetIncomeDivergence { year, .. }
            | Self::UndefinedRatio { year, .. } => *year,
        }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BalanceMismatch {
                year,
                total_assets,
                total_liabilities_and_equity,
                difference,
                ..
            } => write!(
                f,
                "{year}: balance sheet does not balance (assets {total_assets}, liabilities and equity {total_liabilities_and_equity}, gap {difference})."
            ),
            Self::NetIncomeDivergence {
                year,
                computed_net_result,
                reported_net_income,
                ..
            } => write!(
                f,
                "{year}: reported net income {reported_net_income} differs from computed net result {computed_net_result}."
            ),
            Self::UndefinedRatio { year, ratio } => write!(
                f,
                "{year}: {} is not computable (non-positive denominator).",
                ratio.label()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-year derivation
// ---------------------------------------------------------------------------

/// Everything derived from one year's raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct YearDerivation {
    pub aggregates: YearAggregates,
    pub working_capital: WorkingCapitalYear,
    pub ratios: DecisionRatiosYear,
    pub warnings: Vec<DataQualityWarning>,
}

/// Aggregates, then working capital, then ratios, for one year.
pub fn derive_year(
    records: &YearRecords<'_>,
    config: &EngineConfig,
) -> PlanFinanceResult<YearDerivation> {
    let aggregates = compute_aggregates(records)?;
    let working_capital = analyze_working_capital(&aggregates, records.liabilities);
    let ratios = compute_ratios(
        &aggregates,
        records.income_statement,
        records.assets,
        records.liabilities,
    );

    let mut warnings = Vec::new();
    let year = aggregates.year;

    let difference = aggregates.balance_gap();
    let cash_gap = cash_reconciliation_gap(&working_capital, records.assets, records.liabilities);
    if difference.abs() > config.balance_tolerance || cash_gap.abs() > config.balance_tolerance {
        warnings.push(DataQualityWarning::BalanceMismatch {
            year,
            total_assets: aggregates.total_assets,
            total_liabilities_and_equity: aggregates.total_liabilities_and_equity,
            difference,
            cash_reconciliation_gap: cash_gap,
        });
    }

    let reported = records.liabilities.net_income;
    if is_material_divergence(aggregates.net_result, reported, config) {
        warnings.push(DataQualityWarning::NetIncomeDivergence {
            year,
            computed_net_result: aggregates.net_result,
            reported_net_income: reported,
            difference: reported - aggregates.net_result,
        });
    }

    warnings.extend(
        ratios
            .undefined()
            .into_iter()
            .map(|ratio| DataQualityWarning::UndefinedRatio { year, ratio }),
    );

    Ok(YearDerivation {
        aggregates,
        working_capital,
        ratios,
        warnings,
    })
}

fn is_material_divergence(computed: Money, reported: Money, config: &EngineConfig) -> bool {
    let gap = (reported - computed).abs();
    if gap <= config.balance_tolerance {
        return false;
    }
    let scale = computed.abs().max(reported.abs());
    gap > scale * config.net_income_materiality
}

/// Derive every year of `analysis`, in year order.
pub fn derive_all(
    analysis: &HistoricalFinancialAnalysis,
    config: &EngineConfig,
) -> PlanFinanceResult<Vec<YearDerivation>> {
    (0..analysis.year_count())
        .filter_map(|i| analysis.year_at(i))
        .map(|records| derive_year(&records, config))
        .collect()
}

/// Replace derived sequences and warnings in place. Leaves the timestamp and
/// stale markers alone.
pub(crate) fn regenerate(
    analysis: &mut HistoricalFinancialAnalysis,
    config: &EngineConfig,
) -> PlanFinanceResult<()> {
    let derived = derive_all(analysis, config)?;

    let mut working_capital = Vec::with_capacity(derived.len());
    let mut ratios = Vec::with_capacity(derived.len());
    let mut warnings = Vec::new();
    for d in derived {
        tracing::debug!(
            year = d.aggregates.year,
            net_result = %d.aggregates.net_result,
            net_cash_position = %d.working_capital.net_cash_position,
            "year derived"
        );
        working_capital.push(d.working_capital);
        ratios.push(d.ratios);
        warnings.extend(d.warnings);
    }

    analysis.working_capital = working_capital;
    analysis.ratios = ratios;
    analysis.warnings = warnings;
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate `analysis` and return a copy with every derived record
/// regenerated, warnings refreshed, stale markers cleared and
/// `last_recalculated_at` set to `as_of`. Raw sequences are untouched and
/// nothing is persisted.
pub fn recalculate_all(
    analysis: &HistoricalFinancialAnalysis,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> PlanFinanceResult<HistoricalFinancialAnalysis> {
    config.validate()?;
    analysis.validate()?;

    let mut out = analysis.clone();
    regenerate(&mut out, config)?;
    out.stale_years.clear();
    out.last_recalculated_at = Some(as_of);

    for w in &out.warnings {
        match w {
            DataQualityWarning::UndefinedRatio { .. } => {
                tracing::debug!(year = w.year(), "{w}")
            }
            _ => tracing::warn!(project = %out.project_id, year = w.year(), "{w}"),
        }
    }
    tracing::info!(
        project = %out.project_id,
        years = out.year_count(),
        warnings = out.warnings.len(),
        "historical analysis recalculated"
    );
    Ok(out)
}

/// Count of warnings for `year` that a reviewer must look at (undefined
/// ratios excluded).
pub fn blocking_warning_count(analysis: &HistoricalFinancialAnalysis, year: FiscalYear) -> usize {
    analysis
        .warnings
        .iter()
        .filter(|w| w.year() == year)
        .filter(|w| !matches!(w, DataQualityWarning::UndefinedRatio { .. }))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::historical::series::{initialize, StatementKind};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn balanced_analysis() -> HistoricalFinancialAnalysis {
        let mut a = initialize(3, 2021).unwrap();
        for year in 2021..=2023 {
            a.set_field(year, StatementKind::IncomeStatement, "revenue", dec!(1_000_000))
                .unwrap();
            a.set_field(year, StatementKind::IncomeStatement, "personnel_costs", dec!(700_000))
                .unwrap();
            a.set_field(year, StatementKind::Assets, "tangible_assets", dec!(600_000))
                .unwrap();
            a.set_field(year, StatementKind::Assets, "trade_receivables", dec!(200_000))
                .unwrap();
            a.set_field(year, StatementKind::Assets, "cash_and_equivalents", dec!(200_000))
                .unwrap();
            a.set_field(year, StatementKind::Liabilities, "share_capital", dec!(300_000))
                .unwrap();
            a.set_field(year, StatementKind::Liabilities, "net_income", dec!(300_000))
                .unwrap();
            a.set_field(year, StatementKind::Liabilities, "financial_debt", dec!(250_000))
                .unwrap();
            a.set_field(year, StatementKind::Liabilities, "trade_payables", dec!(150_000))
                .unwrap();
        }
        a
    }

    #[test]
    fn test_recalculate_clears_stale_and_stamps_time() {
        let a = balanced_analysis();
        assert_eq!(a.stale_years.len(), 3);
        let r = recalculate_all(&a, as_of(), &EngineConfig::default()).unwrap();
        assert!(r.stale_years.is_empty());
        assert_eq!(r.last_recalculated_at, Some(as_of()));
        assert!(r.is_current());
        assert_eq!(r.income_statements, a.income_statements);
        assert!(r.warnings.is_empty(), "unexpected warnings: {:?}", r.warnings);
    }

    #[test]
    fn test_balance_mismatch_is_warning_not_error() {
        let mut a = balanced_analysis();
        a.set_field(2022, StatementKind::Assets, "cash_and_equivalents", dec!(150_000))
            .unwrap();
        let r = recalculate_all(&a, as_of(), &EngineConfig::default()).unwrap();
        assert_eq!(r.ratios.len(), 3);
        let mismatches: Vec<_> = r
            .warnings
            .iter()
            .filter(|w| matches!(w, DataQualityWarning::BalanceMismatch { .. }))
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].year(), 2022);
        match mismatches[0] {
            DataQualityWarning::BalanceMismatch {
                difference,
                cash_reconciliation_gap,
                ..
            } => {
                assert_eq!(*difference, dec!(-50_000));
                assert_eq!(*cash_reconciliation_gap, dec!(50_000));
            }
            _ => unreachable!(),
        }
        assert_eq!(blocking_warning_count(&r, 2022), 1);
        assert_eq!(blocking_warning_count(&r, 2021), 0);
    }

    #[test]
    fn test_small_gap_within_tolerance() {
        let mut a = balanced_analysis();
        a.set_field(2021, StatementKind::Assets, "cash_and_equivalents", dec!(200_000.005))
            .unwrap();
        let r = recalculate_all(&a, as_of(), &EngineConfig::default()).unwrap();
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_net_income_divergence_flagged() {
        let mut a = balanced_analysis();
        // Computed net result stays 300k; reported drops to 250k and the
        // balance sheet is rebalanced through retained earnings.
        a.set_field(2023, StatementKind::Liabilities, "net_income", dec!(250_000))
            .unwrap();
        a.set_field(2023, StatementKind::Liabilities, "retained_earnings", dec!(50_000))
            .unwrap();
        let r = recalculate_all(&a, as_of(), &EngineConfig::default()).unwrap();
        assert_eq!(r.warnings.len(), 1);
        match &r.warnings[0] {
            DataQualityWarning::NetIncomeDivergence {
                year,
                computed_net_result,
                reported_net_income,
                difference,
            } => {
                assert_eq!(*year, 2023);
                assert_eq!(*computed_net_result, dec!(300_000));
                assert_eq!(*reported_net_income, dec!(250_000));
                assert_eq!(*difference, dec!(-50_000));
            }
            other => panic!("Expected NetIncomeDivergence, got {other:?}"),
        }
        // stored figure is never overwritten
        assert_eq!(r.liabilities[2].net_income, dec!(250_000));
    }

    #[test]
    fn test_blank_series_reports_undefined_ratios() {
        let a = initialize(3, 2021).unwrap();
        let r = recalculate_all(&a, as_of(), &EngineConfig::default()).unwrap();
        let undefined = r
            .warnings
            .iter()
            .filter(|w| matches!(w, DataQualityWarning::UndefinedRatio { .. }))
            .count();
        assert_eq!(undefined, 15);
        assert_eq!(blocking_warning_count(&r, 2021), 0);
    }

    #[test]
    fn test_invalid_series_blocks_recalculation() {
        let mut a = balanced_analysis();
        a.income_statements[0].revenue = dec!(-1);
        assert!(recalculate_all(&a, as_of(), &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_warning_display() {
        let w = DataQualityWarning::UndefinedRatio {
            year: 2022,
            ratio: RatioKind::Solvency,
        };
        assert_eq!(
            w.to_string(),
            "2022: Solvency is not computable (non-positive denominator)."
        );
    }
}
