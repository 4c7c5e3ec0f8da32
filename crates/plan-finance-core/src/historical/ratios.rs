//! The five bank decision ratios.
//!
//! Every ratio is `None` when its denominator is zero or negative. Callers
//! must carry that state through to the report instead of defaulting it.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::aggregates::YearAggregates;
use super::series::{
    normalize_key, BalanceSheetAssetsYear, BalanceSheetLiabilitiesYear, IncomeStatementYear,
};
use crate::types::{FiscalYear, Multiple, Percentage, Years};
use crate::PlanFinanceError;

const HUNDRED: Decimal = dec!(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    FinancialAutonomy,
    DebtRepaymentCapacityYears,
    OverallProfitability,
    CurrentLiquidity,
    Solvency,
}

impl RatioKind {
    pub const ALL: [RatioKind; 5] = [
        Self::FinancialAutonomy,
        Self::DebtRepaymentCapacityYears,
        Self::OverallProfitability,
        Self::CurrentLiquidity,
        Self::Solvency,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::FinancialAutonomy => "financial_autonomy",
            Self::DebtRepaymentCapacityYears => "debt_repayment_capacity_years",
            Self::OverallProfitability => "overall_profitability",
            Self::CurrentLiquidity => "current_liquidity",
            Self::Solvency => "solvency",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FinancialAutonomy => "Financial autonomy",
            Self::DebtRepaymentCapacityYears => "Debt repayment capacity",
            Self::OverallProfitability => "Overall profitability",
            Self::CurrentLiquidity => "Current liquidity",
            Self::Solvency => "Solvency",
        }
    }

    /// Display unit of the computed value.
    pub fn unit(self) -> &'static str {
        match self {
            Self::FinancialAutonomy | Self::OverallProfitability | Self::Solvency => "%",
            Self::DebtRepaymentCapacityYears => "years",
            Self::CurrentLiquidity => "x",
        }
    }
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for RatioKind {
    type Err = PlanFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        Self::ALL
            .into_iter()
            .find(|k| normalize_key(k.key()) == wanted)
            .ok_or_else(|| PlanFinanceError::UnknownRatio(s.to_string()))
    }
}

/// Decision ratios for one year. `None` marks a ratio that cannot be
/// computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRatiosYear {
    pub year: FiscalYear,
    /// Equity / total liabilities and equity, in percent
    pub financial_autonomy: Option<Percentage>,
    /// Financial debt / (net result + depreciation), in years
    pub debt_repayment_capacity_years: Option<Years>,
    /// Net result / total assets, in percent
    pub overall_profitability: Option<Percentage>,
    /// (Receivables + cash) / (current liabilities + overdraft)
    pub current_liquidity: Option<Multiple>,
    /// Equity / external liabilities, in percent
    pub solvency: Option<Percentage>,
}

impl DecisionRatiosYear {
    pub fn value(&self, kind: RatioKind) -> Option<Decimal> {
        match kind {
            RatioKind::FinancialAutonomy => self.financial_autonomy,
            RatioKind::DebtRepaymentCapacityYears => self.debt_repayment_capacity_years,
            RatioKind::OverallProfitability => self.overall_profitability,
            RatioKind::CurrentLiquidity => self.current_liquidity,
            RatioKind::Solvency => self.solvency,
        }
    }

    pub fn undefined(&self) -> Vec<RatioKind> {
        RatioKind::ALL
            .into_iter()
            .filter(|k| self.value(*k).is_none())
            .collect()
    }
}

pub fn compute_ratios(
    aggregates: &YearAggregates,
    income_statement: &IncomeStatementYear,
    assets: &BalanceSheetAssetsYear,
    liabilities: &BalanceSheetLiabilitiesYear,
) -> DecisionRatiosYear {
    let financial_autonomy = ratio(
        aggregates.equity_total,
        aggregates.total_liabilities_and_equity,
    )
    .map(|r| r * HUNDRED);

    // Self-financing capacity proxy: net result plus non-cash charges.
    let debt_repayment_capacity_years = ratio(
        liabilities.financial_debt,
        aggregates.net_result + income_statement.depreciation_and_amortization,
    );

    let overall_profitability =
        ratio(aggregates.net_result, aggregates.total_assets).map(|r| r * HUNDRED);

    let current_liquidity = ratio(
        aggregates.current_assets_total + assets.cash_and_equivalents,
        aggregates.current_liabilities_total + liabilities.bank_overdraft,
    );

    let solvency = ratio(
        aggregates.equity_total,
        aggregates.total_liabilities_and_equity - aggregates.equity_total,
    )
    .map(|r| r * HUNDRED);

    DecisionRatiosYear {
        year: aggregates.year,
        financial_autonomy,
        debt_repayment_capacity_years,
        overall_profitability,
        current_liquidity,
        solvency,
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator <= Decimal::ZERO {
        return None;
    }
    numerator.checked_div(denominator)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::historical::aggregates::compute_aggregates;
    use crate::historical::series::YearRecords;

    fn ratios_for(
        is: &IncomeStatementYear,
        assets: &BalanceSheetAssetsYear,
        liab: &BalanceSheetLiabilitiesYear,
    ) -> DecisionRatiosYear {
        let records = YearRecords {
            income_statement: is,
            assets,
            liabilities: liab,
        };
        let agg = compute_aggregates(&records).unwrap();
        compute_ratios(&agg, is, assets, liab)
    }

    #[test]
    fn test_financial_autonomy_twenty_percent() {
        let is = IncomeStatementYear::blank(2023);
        let assets = BalanceSheetAssetsYear {
            tangible_assets: dec!(1_000_000),
            ..BalanceSheetAssetsYear::blank(2023)
        };
        let liab = BalanceSheetLiabilitiesYear {
            share_capital: dec!(200_000),
            financial_debt: dec!(800_000),
            ..BalanceSheetLiabilitiesYear::blank(2023)
        };
        let r = ratios_for(&is, &assets, &liab);
        assert_eq!(r.financial_autonomy, Some(dec!(20.0)));
        // 200k / 800k = 25%
        assert_eq!(r.solvency, Some(dec!(25)));
    }

    #[test]
    fn test_current_liquidity_exactly_one() {
        let is = IncomeStatementYear::blank(2023);
        let assets = BalanceSheetAssetsYear {
            trade_receivables: dec!(150_000),
            cash_and_equivalents: dec!(50_000),
            ..BalanceSheetAssetsYear::blank(2023)
        };
        let liab = BalanceSheetLiabilitiesYear {
            trade_payables: dec!(100_000),
            bank_overdraft: dec!(100_000),
            ..BalanceSheetLiabilitiesYear::blank(2023)
        };
        let r = ratios_for(&is, &assets, &liab);
        assert_eq!(r.current_liquidity, Some(dec!(1.0)));
    }

    #[test]
    fn test_debt_repayment_capacity() {
        let is = IncomeStatementYear {
            revenue: dec!(1_000_000),
            personnel_costs: dec!(600_000),
            depreciation_and_amortization: dec!(100_000),
            ..IncomeStatementYear::blank(2023)
        };
        let assets = BalanceSheetAssetsYear::blank(2023);
        let liab = BalanceSheetLiabilitiesYear {
            financial_debt: dec!(900_000),
            ..BalanceSheetLiabilitiesYear::blank(2023)
        };
        let r = ratios_for(&is, &assets, &liab);
        // net result 300k + D&A 100k = 400k; 900k / 400k = 2.25 years
        assert_eq!(r.debt_repayment_capacity_years, Some(dec!(2.25)));
    }

    #[test]
    fn test_debt_repayment_undefined_on_loss() {
        let is = IncomeStatementYear {
            revenue: dec!(100_000),
            personnel_costs: dec!(400_000),
            depreciation_and_amortization: dec!(50_000),
            ..IncomeStatementYear::blank(2023)
        };
        let assets = BalanceSheetAssetsYear::blank(2023);
        let liab = BalanceSheetLiabilitiesYear {
            financial_debt: dec!(500_000),
            ..BalanceSheetLiabilitiesYear::blank(2023)
        };
        let r = ratios_for(&is, &assets, &liab);
        assert_eq!(r.debt_repayment_capacity_years, None);
    }

    #[test]
    fn test_solvency_undefined_without_external_liabilities() {
        let is = IncomeStatementYear::blank(2023);
        let assets = BalanceSheetAssetsYear {
            tangible_assets: dec!(500_000),
            ..BalanceSheetAssetsYear::blank(2023)
        };
        let liab = BalanceSheetLiabilitiesYear {
            share_capital: dec!(500_000),
            ..BalanceSheetLiabilitiesYear::blank(2023)
        };
        let r = ratios_for(&is, &assets, &liab);
        assert_eq!(r.solvency, None);
        assert_eq!(r.financial_autonomy, Some(dec!(100)));
    }

    #[test]
    fn test_blank_year_all_undefined() {
        let is = IncomeStatementYear::blank(2023);
        let assets = BalanceSheetAssetsYear::blank(2023);
        let liab = BalanceSheetLiabilitiesYear::blank(2023);
        let r = ratios_for(&is, &assets, &liab);
        assert_eq!(r.undefined(), RatioKind::ALL.to_vec());
    }

    #[test]
    fn test_ratio_kind_parsing() {
        assert_eq!(
            "financialAutonomy".parse::<RatioKind>().unwrap(),
            RatioKind::FinancialAutonomy
        );
        assert_eq!(
            "debt_repayment_capacity_years".parse::<RatioKind>().unwrap(),
            RatioKind::DebtRepaymentCapacityYears
        );
        match "gearing".parse::<RatioKind>().unwrap_err() {
            PlanFinanceError::UnknownRatio(name) => assert_eq!(name, "gearing"),
            other => panic!("Expected UnknownRatio, got {other:?}"),
        }
    }
}
