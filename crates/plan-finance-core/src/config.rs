use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};
use crate::{PlanFinanceError, PlanFinanceResult};

/// Default absolute tolerance when reconciling balance-sheet totals.
pub const DEFAULT_BALANCE_TOLERANCE: Money = dec!(0.01);

/// Default relative gap between computed net result and reported net income
/// that is considered material.
pub const DEFAULT_NET_INCOME_MATERIALITY: Rate = dec!(0.01);

/// Tolerances applied when deriving data-quality warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Absolute gap allowed between total assets and total liabilities and
    /// equity (and between net cash position and cash minus overdraft).
    pub balance_tolerance: Money,
    /// Relative gap allowed between the computed net result and the net
    /// income carried on the liabilities side.
    pub net_income_materiality: Rate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: DEFAULT_BALANCE_TOLERANCE,
            net_income_materiality: DEFAULT_NET_INCOME_MATERIALITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> PlanFinanceResult<()> {
        if self.balance_tolerance < Decimal::ZERO {
            return Err(PlanFinanceError::validation(
                "balance_tolerance",
                "Balance tolerance cannot be negative.",
            ));
        }
        if self.net_income_materiality < Decimal::ZERO {
            return Err(PlanFinanceError::validation(
                "net_income_materiality",
                "Net income materiality cannot be negative.",
            ));
        }
        Ok(())
    }
}
