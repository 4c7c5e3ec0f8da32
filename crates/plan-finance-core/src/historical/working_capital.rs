use serde::{Deserialize, Serialize};

use super::aggregates::YearAggregates;
use super::series::{BalanceSheetAssetsYear, BalanceSheetLiabilitiesYear};
use crate::types::{FiscalYear, Money};

/// Funding-structure triad for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingCapitalYear {
    pub year: FiscalYear,
    /// Stable resources (equity + financial debt) less fixed assets
    pub working_capital: Money,
    /// Operating receivables less operating payables
    pub operating_capital_requirement: Money,
    /// Working capital less operating capital requirement
    pub net_cash_position: Money,
}

pub fn analyze_working_capital(
    aggregates: &YearAggregates,
    liabilities: &BalanceSheetLiabilitiesYear,
) -> WorkingCapitalYear {
    let working_capital =
        (aggregates.equity_total + liabilities.financial_debt) - aggregates.fixed_assets_total;
    let operating_capital_requirement =
        aggregates.current_assets_total - aggregates.current_liabilities_total;
    let net_cash_position = working_capital - operating_capital_requirement;

    WorkingCapitalYear {
        year: aggregates.year,
        working_capital,
        operating_capital_requirement,
        net_cash_position,
    }
}

/// Treasury as carried on the balance sheet: cash less bank overdraft.
pub fn balance_sheet_treasury(
    assets: &BalanceSheetAssetsYear,
    liabilities: &BalanceSheetLiabilitiesYear,
) -> Money {
    assets.cash_and_equivalents - liabilities.bank_overdraft
}

/// Net cash position minus balance-sheet treasury. Non-zero only when the
/// balance sheet itself does not balance.
pub fn cash_reconciliation_gap(
    working_capital: &WorkingCapitalYear,
    assets: &BalanceSheetAssetsYear,
    liabilities: &BalanceSheetLiabilitiesYear,
) -> Money {
    working_capital.net_cash_position - balance_sheet_treasury(assets, liabilities)
}
