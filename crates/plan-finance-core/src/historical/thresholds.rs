//! Threshold tables that map a decision ratio to a qualitative tier.
//!
//! The table is plain data: each ratio lists its Excellent, Good and
//! Acceptable bounds in that order, and anything that matches none of them is
//! Problematic. Bounds are tested best tier first, so a value sitting exactly
//! on a cut point takes the better tier.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ratios::RatioKind;
use crate::PlanFinanceResult;

/// Bumped whenever a cut point or comparison changes.
pub const THRESHOLD_TABLE_VERSION: &str = "2024.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Excellent,
    Good,
    Acceptable,
    Problematic,
    /// The ratio could not be computed (non-positive denominator).
    Undefined,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Acceptable => "Acceptable",
            Self::Problematic => "Problematic",
            Self::Undefined => "Not computable",
        }
    }

    pub fn is_defined(self) -> bool {
        self != Self::Undefined
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    Above,
    Equal,
    AtMost,
    Below,
}

impl Comparison {
    pub fn holds(self, value: Decimal, cut: Decimal) -> bool {
        match self {
            Self::AtLeast => value >= cut,
            Self::Above => value > cut,
            Self::Equal => value == cut,
            Self::AtMost => value <= cut,
            Self::Below => value < cut,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::Above => ">",
            Self::Equal => "=",
            Self::AtMost => "<=",
            Self::Below => "<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierBound {
    pub tier: Tier,
    pub comparison: Comparison,
    pub cut: Decimal,
}

impl TierBound {
    const fn new(tier: Tier, comparison: Comparison, cut: Decimal) -> Self {
        Self {
            tier,
            comparison,
            cut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioThresholds {
    pub ratio: RatioKind,
    pub direction: Direction,
    /// Excellent, Good, Acceptable, best first.
    pub bounds: [TierBound; 3],
}

impl RatioThresholds {
    /// Classify a computed value; `None` maps to `Tier::Undefined`.
    pub fn classify(&self, value: Option<Decimal>) -> Tier {
        let Some(v) = value else {
            return Tier::Undefined;
        };
        self.bounds
            .iter()
            .find(|b| b.comparison.holds(v, b.cut))
            .map(|b| b.tier)
            .unwrap_or(Tier::Problematic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdTable {
    pub version: &'static str,
    pub ratios: [RatioThresholds; 5],
}

impl ThresholdTable {
    pub fn for_ratio(&self, kind: RatioKind) -> &RatioThresholds {
        // Every RatioKind has exactly one row; see test_table_covers_every_ratio.
        let idx = match kind {
            RatioKind::FinancialAutonomy => 0,
            RatioKind::DebtRepaymentCapacityYears => 1,
            RatioKind::OverallProfitability => 2,
            RatioKind::CurrentLiquidity => 3,
            RatioKind::Solvency => 4,
        };
        &self.ratios[idx]
    }
}

use Comparison::{Above, AtLeast, AtMost, Equal};
use Tier::{Acceptable, Excellent, Good};

pub static THRESHOLD_TABLE: ThresholdTable = ThresholdTable {
    version: THRESHOLD_TABLE_VERSION,
    ratios: [
        RatioThresholds {
            ratio: RatioKind::FinancialAutonomy,
            direction: Direction::HigherIsBetter,
            bounds: [
                TierBound::new(Excellent, AtLeast, dec!(30)),
                TierBound::new(Good, AtLeast, dec!(20)),
                TierBound::new(Acceptable, AtLeast, dec!(10)),
            ],
        },
        RatioThresholds {
            ratio: RatioKind::DebtRepaymentCapacityYears,
            direction: Direction::LowerIsBetter,
            bounds: [
                TierBound::new(Excellent, AtMost, dec!(2)),
                TierBound::new(Good, AtMost, dec!(4)),
                TierBound::new(Acceptable, AtMost, dec!(6)),
            ],
        },
        RatioThresholds {
            ratio: RatioKind::OverallProfitability,
            direction: Direction::HigherIsBetter,
            bounds: [
                TierBound::new(Excellent, Above, dec!(10)),
                TierBound::new(Good, Above, dec!(0)),
                TierBound::new(Acceptable, Equal, dec!(0)),
            ],
        },
        RatioThresholds {
            ratio: RatioKind::CurrentLiquidity,
            direction: Direction::HigherIsBetter,
            bounds: [
                TierBound::new(Excellent, AtLeast, dec!(1.5)),
                TierBound::new(Good, Above, dec!(1)),
                TierBound::new(Acceptable, Equal, dec!(1)),
            ],
        },
        RatioThresholds {
            ratio: RatioKind::Solvency,
            direction: Direction::HigherIsBetter,
            bounds: [
                TierBound::new(Excellent, AtLeast, dec!(30)),
                TierBound::new(Good, AtLeast, dec!(20)),
                TierBound::new(Acceptable, AtLeast, dec!(10)),
            ],
        },
    ],
};

/// Classify `value` for the ratio named `ratio_name` (snake_case or
/// camelCase). Unknown names are an error; an undefined value is not.
pub fn evaluate(ratio_name: &str, value: Option<Decimal>) -> PlanFinanceResult<Tier> {
    let kind: RatioKind = ratio_name.parse()?;
    Ok(evaluate_kind(kind, value))
}

pub fn evaluate_kind(kind: RatioKind, value: Option<Decimal>) -> Tier {
    THRESHOLD_TABLE.for_ratio(kind).classify(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlanFinanceError;

    #[test]
    fn test_table_covers_every_ratio() {
        for kind in RatioKind::ALL {
            assert_eq!(THRESHOLD_TABLE.for_ratio(kind).ratio, kind);
        }
    }

    #[test]
    fn test_financial_autonomy_cut_points() {
        let t = |v| evaluate_kind(RatioKind::FinancialAutonomy, Some(v));
        assert_eq!(t(dec!(45)), Tier::Excellent);
        assert_eq!(t(dec!(30)), Tier::Excellent);
        assert_eq!(t(dec!(29.99)), Tier::Good);
        assert_eq!(t(dec!(20.0)), Tier::Good);
        assert_eq!(t(dec!(19.999)), Tier::Acceptable);
        assert_eq!(t(dec!(10)), Tier::Acceptable);
        assert_eq!(t(dec!(9.5)), Tier::Problematic);
    }

    #[test]
    fn test_debt_repayment_lower_is_better() {
        let t = |v| evaluate_kind(RatioKind::DebtRepaymentCapacityYears, Some(v));
        assert_eq!(t(dec!(0)), Tier::Excellent);
        assert_eq!(t(dec!(2)), Tier::Excellent);
        assert_eq!(t(dec!(2.01)), Tier::Good);
        assert_eq!(t(dec!(4)), Tier::Good);
        assert_eq!(t(dec!(6)), Tier::Acceptable);
        assert_eq!(t(dec!(6.5)), Tier::Problematic);
    }

    #[test]
    fn test_profitability_zero_is_acceptable() {
        let t = |v| evaluate_kind(RatioKind::OverallProfitability, Some(v));
        assert_eq!(t(dec!(10.5)), Tier::Excellent);
        assert_eq!(t(dec!(10)), Tier::Good);
        assert_eq!(t(dec!(0.01)), Tier::Good);
        assert_eq!(t(dec!(0)), Tier::Acceptable);
        assert_eq!(t(dec!(-0.01)), Tier::Problematic);
    }

    #[test]
    fn test_current_liquidity_tiers() {
        let t = |v| evaluate_kind(RatioKind::CurrentLiquidity, Some(v));
        assert_eq!(t(dec!(1.5)), Tier::Excellent);
        assert_eq!(t(dec!(1.2)), Tier::Good);
        assert_eq!(t(dec!(1.0)), Tier::Acceptable);
        assert_eq!(t(dec!(0.99)), Tier::Problematic);
    }

    #[test]
    fn test_undefined_value_is_not_an_error() {
        assert_eq!(evaluate("solvency", None).unwrap(), Tier::Undefined);
        assert_eq!(
            evaluate("debtRepaymentCapacityYears", None).unwrap(),
            Tier::Undefined
        );
    }

    #[test]
    fn test_unknown_ratio_rejected() {
        match evaluate("quick_ratio", Some(dec!(1))).unwrap_err() {
            PlanFinanceError::UnknownRatio(name) => assert_eq!(name, "quick_ratio"),
            other => panic!("Expected UnknownRatio, got {other:?}"),
        }
    }

    #[test]
    fn test_table_serializes_with_version() {
        let json = serde_json::to_value(THRESHOLD_TABLE).unwrap();
        assert_eq!(json["version"], "2024.1");
        assert_eq!(json["ratios"][1]["direction"], "lower_is_better");
        assert_eq!(json["ratios"][0]["bounds"][0]["comparison"], "at_least");
    }
}
