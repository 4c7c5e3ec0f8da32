//! Per-year intermediate aggregates (SYSCOHADA-style sub-totals).
//!
//! Everything here is a pure function of a single year's raw records; there
//! is no cross-year dependency.

use serde::{Deserialize, Serialize};

use super::series::{
    BalanceSheetAssetsYear, BalanceSheetLiabilitiesYear, IncomeStatementYear, YearRecords,
};
use crate::types::{FiscalYear, Money};
use crate::{PlanFinanceError, PlanFinanceResult};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Income-statement sub-totals for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeAggregates {
    /// Revenue less external purchases, transport, services and duties
    pub value_added: Money,
    /// Value added less personnel costs and depreciation
    pub operating_result: Money,
    /// Operating result less financial charges and income tax
    pub net_result: Money,
}

/// Balance-sheet totals for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceAggregates {
    pub fixed_assets_total: Money,
    /// Trade plus other receivables (cash excluded)
    pub current_assets_total: Money,
    pub total_assets: Money,
    pub equity_total: Money,
    /// Trade payables, tax and social liabilities, other liabilities
    pub current_liabilities_total: Money,
    pub total_liabilities_and_equity: Money,
}

/// All aggregates for one year, flattened for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearAggregates {
    pub year: FiscalYear,
    pub value_added: Money,
    pub operating_result: Money,
    pub net_result: Money,
    pub fixed_assets_total: Money,
    pub current_assets_total: Money,
    pub total_assets: Money,
    pub equity_total: Money,
    pub current_liabilities_total: Money,
    pub total_liabilities_and_equity: Money,
}

impl YearAggregates {
    /// Total assets minus total liabilities and equity. Zero for a balanced
    /// sheet.
    pub fn balance_gap(&self) -> Money {
        self.total_assets - self.total_liabilities_and_equity
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn income_aggregates(is: &IncomeStatementYear) -> IncomeAggregates {
    let value_added = is.revenue
        - is.raw_material_purchases
        - is.other_purchases
        - is.transport_costs
        - is.external_services
        - is.taxes_and_duties;
    let operating_result = value_added - is.personnel_costs - is.depreciation_and_amortization;
    let net_result = operating_result - is.financial_charges - is.income_tax;

    IncomeAggregates {
        value_added,
        operating_result,
        net_result,
    }
}

pub fn balance_aggregates(
    assets: &BalanceSheetAssetsYear,
    liabilities: &BalanceSheetLiabilitiesYear,
) -> BalanceAggregates {
    let fixed_assets_total = assets.intangible_assets + assets.tangible_assets;
    let current_assets_total = assets.trade_receivables + assets.other_receivables;
    let total_assets = fixed_assets_total + current_assets_total + assets.cash_and_equivalents;

    let equity_total = liabilities.share_capital
        + liabilities.premiums_and_reserves
        + liabilities.retained_earnings
        + liabilities.net_income;
    let current_liabilities_total = liabilities.trade_payables
        + liabilities.tax_and_social_liabilities
        + liabilities.other_liabilities;
    let total_liabilities_and_equity = equity_total
        + liabilities.financial_debt
        + current_liabilities_total
        + liabilities.bank_overdraft;

    BalanceAggregates {
        fixed_assets_total,
        current_assets_total,
        total_assets,
        equity_total,
        current_liabilities_total,
        total_liabilities_and_equity,
    }
}

/// Compute every aggregate for one year. The three records must carry the
/// same fiscal year.
pub fn compute_aggregates(records: &YearRecords<'_>) -> PlanFinanceResult<YearAggregates> {
    let year = records.year();
    if records.assets.year != year || records.liabilities.year != year {
        return Err(PlanFinanceError::validation(
            "year",
            format!(
                "Cannot aggregate mismatched records (income {year}, assets {}, liabilities {}).",
                records.assets.year, records.liabilities.year
            ),
        ));
    }

    let income = income_aggregates(records.income_statement);
    let balance = balance_aggregates(records.assets, records.liabilities);

    Ok(YearAggregates {
        year,
        value_added: income.value_added,
        operating_result: income.operating_result,
        net_result: income.net_result,
        fixed_assets_total: balance.fixed_assets_total,
        current_assets_total: balance.current_assets_total,
        total_assets: balance.total_assets,
        equity_total: balance.equity_total,
        current_liabilities_total: balance.current_liabilities_total,
        total_liabilities_and_equity: balance.total_liabilities_and_equity,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
