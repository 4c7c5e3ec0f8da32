//! Raw per-year statement records and the analysis aggregate root.
//!
//! The three raw sequences (income statement, assets, liabilities) are owned
//! here together with the derived sequences they produce. Derived records are
//! never edited in place: `set_field` only marks the touched year stale and
//! the orchestrator in [`super::recalc`] regenerates everything.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ratios::DecisionRatiosYear;
use super::recalc::{self, DataQualityWarning};
use super::working_capital::WorkingCapitalYear;
use crate::config::EngineConfig;
use crate::types::{FiscalYear, Money};
use crate::{PlanFinanceError, PlanFinanceResult};

/// Number of historical years a business plan carries.
pub const DEFAULT_YEAR_COUNT: usize = 3;

/// Upper bound on the number of fiscal years in one analysis.
pub const MAX_YEAR_COUNT: usize = 50;

// ---------------------------------------------------------------------------
// Statement kinds and field names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    IncomeStatement,
    Assets,
    Liabilities,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::IncomeStatement,
        StatementKind::Assets,
        StatementKind::Liabilities,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::Assets => "assets",
            Self::Liabilities => "liabilities",
        }
    }

    /// Field names accepted by `set_field` for this statement.
    pub fn field_names(self) -> Vec<&'static str> {
        match self {
            Self::IncomeStatement => IncomeStatementField::ALL.iter().map(|f| f.key()).collect(),
            Self::Assets => AssetField::ALL.iter().map(|f| f.key()).collect(),
            Self::Liabilities => LiabilityField::ALL.iter().map(|f| f.key()).collect(),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for StatementKind {
    type Err = PlanFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        if wanted == "income" {
            return Ok(Self::IncomeStatement);
        }
        Self::ALL
            .into_iter()
            .find(|k| normalize_key(k.key()) == wanted)
            .ok_or_else(|| {
                PlanFinanceError::validation(
                    "statement_kind",
                    format!("'{s}' is not one of income_statement, assets, liabilities."),
                )
            })
    }
}

/// Case- and separator-insensitive key so that `rawMaterialPurchases`,
/// `raw_material_purchases` and `raw-material-purchases` all match.
pub(crate) fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeStatementField {
    Revenue,
    RawMaterialPurchases,
    OtherPurchases,
    TransportCosts,
    ExternalServices,
    TaxesAndDuties,
    PersonnelCosts,
    DepreciationAndAmortization,
    FinancialCharges,
    IncomeTax,
}

impl IncomeStatementField {
    pub const ALL: [IncomeStatementField; 10] = [
        Self::Revenue,
        Self::RawMaterialPurchases,
        Self::OtherPurchases,
        Self::TransportCosts,
        Self::ExternalServices,
        Self::TaxesAndDuties,
        Self::PersonnelCosts,
        Self::DepreciationAndAmortization,
        Self::FinancialCharges,
        Self::IncomeTax,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::RawMaterialPurchases => "raw_material_purchases",
            Self::OtherPurchases => "other_purchases",
            Self::TransportCosts => "transport_costs",
            Self::ExternalServices => "external_services",
            Self::TaxesAndDuties => "taxes_and_duties",
            Self::PersonnelCosts => "personnel_costs",
            Self::DepreciationAndAmortization => "depreciation_and_amortization",
            Self::FinancialCharges => "financial_charges",
            Self::IncomeTax => "income_tax",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetField {
    IntangibleAssets,
    TangibleAssets,
    TradeReceivables,
    OtherReceivables,
    CashAndEquivalents,
}

impl AssetField {
    pub const ALL: [AssetField; 5] = [
        Self::IntangibleAssets,
        Self::TangibleAssets,
        Self::TradeReceivables,
        Self::OtherReceivables,
        Self::CashAndEquivalents,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::IntangibleAssets => "intangible_assets",
            Self::TangibleAssets => "tangible_assets",
            Self::TradeReceivables => "trade_receivables",
            Self::OtherReceivables => "other_receivables",
            Self::CashAndEquivalents => "cash_and_equivalents",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiabilityField {
    ShareCapital,
    PremiumsAndReserves,
    RetainedEarnings,
    NetIncome,
    FinancialDebt,
    TradePayables,
    TaxAndSocialLiabilities,
    OtherLiabilities,
    BankOverdraft,
}

impl LiabilityField {
    pub const ALL: [LiabilityField; 9] = [
        Self::ShareCapital,
        Self::PremiumsAndReserves,
        Self::RetainedEarnings,
        Self::NetIncome,
        Self::FinancialDebt,
        Self::TradePayables,
        Self::TaxAndSocialLiabilities,
        Self::OtherLiabilities,
        Self::BankOverdraft,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::ShareCapital => "share_capital",
            Self::PremiumsAndReserves => "premiums_and_reserves",
            Self::RetainedEarnings => "retained_earnings",
            Self::NetIncome => "net_income",
            Self::FinancialDebt => "financial_debt",
            Self::TradePayables => "trade_payables",
            Self::TaxAndSocialLiabilities => "tax_and_social_liabilities",
            Self::OtherLiabilities => "other_liabilities",
            Self::BankOverdraft => "bank_overdraft",
        }
    }
}

/// A field resolved against its owning statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "statement", content = "field", rename_all = "snake_case")]
pub enum StatementField {
    IncomeStatement(IncomeStatementField),
    Assets(AssetField),
    Liabilities(LiabilityField),
}

impl StatementField {
    /// Resolve `name` within `kind`. Returns a validation error when the name
    /// belongs to another statement or to none.
    pub fn resolve(kind: StatementKind, name: &str) -> PlanFinanceResult<Self> {
        let wanted = normalize_key(name);
        let found = match kind {
            StatementKind::IncomeStatement => IncomeStatementField::ALL
                .into_iter()
                .find(|f| normalize_key(f.key()) == wanted)
                .map(Self::IncomeStatement),
            StatementKind::Assets => AssetField::ALL
                .into_iter()
                .find(|f| normalize_key(f.key()) == wanted)
                .map(Self::Assets),
            StatementKind::Liabilities => LiabilityField::ALL
                .into_iter()
                .find(|f| normalize_key(f.key()) == wanted)
                .map(Self::Liabilities),
        };
        found.ok_or_else(|| {
            PlanFinanceError::validation(
                name,
                format!("'{name}' is not a field of the {kind} statement."),
            )
        })
    }

    pub fn kind(self) -> StatementKind {
        match self {
            Self::IncomeStatement(_) => StatementKind::IncomeStatement,
            Self::Assets(_) => StatementKind::Assets,
            Self::Liabilities(_) => StatementKind::Liabilities,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::IncomeStatement(f) => f.key(),
            Self::Assets(f) => f.key(),
            Self::Liabilities(f) => f.key(),
        }
    }
}

// ---------------------------------------------------------------------------
// Year records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatementYear {
    pub year: FiscalYear,
    pub revenue: Money,
    pub raw_material_purchases: Money,
    pub other_purchases: Money,
    pub transport_costs: Money,
    pub external_services: Money,
    pub taxes_and_duties: Money,
    pub personnel_costs: Money,
    pub depreciation_and_amortization: Money,
    pub financial_charges: Money,
    pub income_tax: Money,
}

impl IncomeStatementYear {
    pub fn blank(year: FiscalYear) -> Self {
        Self {
            year,
            revenue: Decimal::ZERO,
            raw_material_purchases: Decimal::ZERO,
            other_purchases: Decimal::ZERO,
            transport_costs: Decimal::ZERO,
            external_services: Decimal::ZERO,
            taxes_and_duties: Decimal::ZERO,
            personnel_costs: Decimal::ZERO,
            depreciation_and_amortization: Decimal::ZERO,
            financial_charges: Decimal::ZERO,
            income_tax: Decimal::ZERO,
        }
    }

    pub fn get(&self, field: IncomeStatementField) -> Money {
        match field {
            IncomeStatementField::Revenue => self.revenue,
            IncomeStatementField::RawMaterialPurchases => self.raw_material_purchases,
            IncomeStatementField::OtherPurchases => self.other_purchases,
            IncomeStatementField::TransportCosts => self.transport_costs,
            IncomeStatementField::ExternalServices => self.external_services,
            IncomeStatementField::TaxesAndDuties => self.taxes_and_duties,
            IncomeStatementField::PersonnelCosts => self.personnel_costs,
            IncomeStatementField::DepreciationAndAmortization => self.depreciation_and_amortization,
            IncomeStatementField::FinancialCharges => self.financial_charges,
            IncomeStatementField::IncomeTax => self.income_tax,
        }
    }

    fn field_mut(&mut self, field: IncomeStatementField) -> &mut Money {
        match field {
            IncomeStatementField::Revenue => &mut self.revenue,
            IncomeStatementField::RawMaterialPurchases => &mut self.raw_material_purchases,
            IncomeStatementField::OtherPurchases => &mut self.other_purchases,
            IncomeStatementField::TransportCosts => &mut self.transport_costs,
            IncomeStatementField::ExternalServices => &mut self.external_services,
            IncomeStatementField::TaxesAndDuties => &mut self.taxes_and_duties,
            IncomeStatementField::PersonnelCosts => &mut self.personnel_costs,
            IncomeStatementField::DepreciationAndAmortization => {
                &mut self.depreciation_and_amortization
            }
            IncomeStatementField::FinancialCharges => &mut self.financial_charges,
            IncomeStatementField::IncomeTax => &mut self.income_tax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetAssetsYear {
    pub year: FiscalYear,
    pub intangible_assets: Money,
    pub tangible_assets: Money,
    pub trade_receivables: Money,
    pub other_receivables: Money,
    pub cash_and_equivalents: Money,
}

impl BalanceSheetAssetsYear {
    pub fn blank(year: FiscalYear) -> Self {
        Self {
            year,
            intangible_assets: Decimal::ZERO,
            tangible_assets: Decimal::ZERO,
            trade_receivables: Decimal::ZERO,
            other_receivables: Decimal::ZERO,
            cash_and_equivalents: Decimal::ZERO,
        }
    }

    pub fn get(&self, field: AssetField) -> Money {
        match field {
            AssetField::IntangibleAssets => self.intangible_assets,
            AssetField::TangibleAssets => self.tangible_assets,
            AssetField::TradeReceivables => self.trade_receivables,
            AssetField::OtherReceivables => self.other_receivables,
            AssetField::CashAndEquivalents => self.cash_and_equivalents,
        }
    }

    fn field_mut(&mut self, field: AssetField) -> &mut Money {
        match field {
            AssetField::IntangibleAssets => &mut self.intangible_assets,
            AssetField::TangibleAssets => &mut self.tangible_assets,
            AssetField::TradeReceivables => &mut self.trade_receivables,
            AssetField::OtherReceivables => &mut self.other_receivables,
            AssetField::CashAndEquivalents => &mut self.cash_and_equivalents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetLiabilitiesYear {
    pub year: FiscalYear,
    pub share_capital: Money,
    pub premiums_and_reserves: Money,
    pub retained_earnings: Money,
    /// Net income as entered by the owner; never overwritten by the engine.
    pub net_income: Money,
    pub financial_debt: Money,
    pub trade_payables: Money,
    pub tax_and_social_liabilities: Money,
    pub other_liabilities: Money,
    pub bank_overdraft: Money,
}

impl BalanceSheetLiabilitiesYear {
    pub fn blank(year: FiscalYear) -> Self {
        Self {
            year,
            share_capital: Decimal::ZERO,
            premiums_and_reserves: Decimal::ZERO,
            retained_earnings: Decimal::ZERO,
            net_income: Decimal::ZERO,
            financial_debt: Decimal::ZERO,
            trade_payables: Decimal::ZERO,
            tax_and_social_liabilities: Decimal::ZERO,
            other_liabilities: Decimal::ZERO,
            bank_overdraft: Decimal::ZERO,
        }
    }

    pub fn get(&self, field: LiabilityField) -> Money {
        match field {
            LiabilityField::ShareCapital => self.share_capital,
            LiabilityField::PremiumsAndReserves => self.premiums_and_reserves,
            LiabilityField::RetainedEarnings => self.retained_earnings,
            LiabilityField::NetIncome => self.net_income,
            LiabilityField::FinancialDebt => self.financial_debt,
            LiabilityField::TradePayables => self.trade_payables,
            LiabilityField::TaxAndSocialLiabilities => self.tax_and_social_liabilities,
            LiabilityField::OtherLiabilities => self.other_liabilities,
            LiabilityField::BankOverdraft => self.bank_overdraft,
        }
    }

    fn field_mut(&mut self, field: LiabilityField) -> &mut Money {
        match field {
            LiabilityField::ShareCapital => &mut self.share_capital,
            LiabilityField::PremiumsAndReserves => &mut self.premiums_and_reserves,
            LiabilityField::RetainedEarnings => &mut self.retained_earnings,
            LiabilityField::NetIncome => &mut self.net_income,
            LiabilityField::FinancialDebt => &mut self.financial_debt,
            LiabilityField::TradePayables => &mut self.trade_payables,
            LiabilityField::TaxAndSocialLiabilities => &mut self.tax_and_social_liabilities,
            LiabilityField::OtherLiabilities => &mut self.other_liabilities,
            LiabilityField::BankOverdraft => &mut self.bank_overdraft,
        }
    }
}

/// Borrowed view of the three raw records of one fiscal year.
#[derive(Debug, Clone, Copy)]
pub struct YearRecords<'a> {
    pub income_statement: &'a IncomeStatementYear,
    pub assets: &'a BalanceSheetAssetsYear,
    pub liabilities: &'a BalanceSheetLiabilitiesYear,
}

impl YearRecords<'_> {
    pub fn year(&self) -> FiscalYear {
        self.income_statement.year
    }
}

// ---------------------------------------------------------------------------
// Aggregate root
// ---------------------------------------------------------------------------

/// Multi-year historical analysis attached to one business-plan project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalFinancialAnalysis {
    pub project_id: String,
    pub owner_id: String,
    pub period_start_year: FiscalYear,
    pub period_end_year: FiscalYear,
    pub income_statements: Vec<IncomeStatementYear>,
    pub assets: Vec<BalanceSheetAssetsYear>,
    pub liabilities: Vec<BalanceSheetLiabilitiesYear>,
    #[serde(default)]
    pub working_capital: Vec<WorkingCapitalYear>,
    #[serde(default)]
    pub ratios: Vec<DecisionRatiosYear>,
    /// Data-quality conditions found by the last recalculation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DataQualityWarning>,
    /// Years edited since the last recalculation.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub stale_years: BTreeSet<FiscalYear>,
    /// Optimistic-concurrency token owned by the storage layer.
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub last_recalculated_at: Option<DateTime<Utc>>,
}

/// Build `year_count` consecutive blank years starting at `start_year`.
pub fn initialize(
    year_count: usize,
    start_year: FiscalYear,
) -> PlanFinanceResult<HistoricalFinancialAnalysis> {
    if year_count == 0 {
        return Err(PlanFinanceError::validation(
            "year_count",
            "At least one fiscal year is required.",
        ));
    }
    if year_count > MAX_YEAR_COUNT {
        return Err(PlanFinanceError::validation(
            "year_count",
            format!("At most {MAX_YEAR_COUNT} fiscal years are supported (got {year_count})."),
        ));
    }
    let end_year = FiscalYear::try_from(year_count - 1)
        .ok()
        .and_then(|offset| start_year.checked_add(offset))
        .ok_or_else(|| PlanFinanceError::validation("year_count", "Fiscal year out of range."))?;

    let years = start_year..=end_year;
    let mut analysis = HistoricalFinancialAnalysis {
        project_id: String::new(),
        owner_id: String::new(),
        period_start_year: start_year,
        period_end_year: end_year,
        income_statements: years.clone().map(IncomeStatementYear::blank).collect(),
        assets: years.clone().map(BalanceSheetAssetsYear::blank).collect(),
        liabilities: years.map(BalanceSheetLiabilitiesYear::blank).collect(),
        working_capital: Vec::new(),
        ratios: Vec::new(),
        warnings: Vec::new(),
        stale_years: BTreeSet::new(),
        version: 0,
        last_recalculated_at: None,
    };
    recalc::regenerate(&mut analysis, &EngineConfig::default())?;
    Ok(analysis)
}

/// Seed a new project with the next three fiscal years after `current_year`.
pub fn initialize_for_project(
    project_id: &str,
    owner_id: &str,
    current_year: FiscalYear,
) -> PlanFinanceResult<HistoricalFinancialAnalysis> {
    let start_year = current_year
        .checked_add(1)
        .ok_or_else(|| PlanFinanceError::validation("current_year", "Fiscal year out of range."))?;
    let mut analysis = initialize(DEFAULT_YEAR_COUNT, start_year)?;
    analysis.project_id = project_id.to_string();
    analysis.owner_id = owner_id.to_string();
    Ok(analysis)
}

impl HistoricalFinancialAnalysis {
    pub fn year_count(&self) -> usize {
        self.income_statements.len()
    }

    pub fn years(&self) -> Vec<FiscalYear> {
        self.income_statements.iter().map(|r| r.year).collect()
    }

    pub fn year_index(&self, year: FiscalYear) -> Option<usize> {
        self.income_statements.iter().position(|r| r.year == year)
    }

    /// Raw records at `index`, if all three sequences reach that far.
    pub fn year_at(&self, index: usize) -> Option<YearRecords<'_>> {
        Some(YearRecords {
            income_statement: self.income_statements.get(index)?,
            assets: self.assets.get(index)?,
            liabilities: self.liabilities.get(index)?,
        })
    }

    pub fn records_for(&self, year: FiscalYear) -> Option<YearRecords<'_>> {
        self.year_index(year).and_then(|i| self.year_at(i))
    }

    pub fn working_capital_for(&self, year: FiscalYear) -> Option<&WorkingCapitalYear> {
        self.working_capital.iter().find(|w| w.year == year)
    }

    pub fn ratios_for(&self, year: FiscalYear) -> Option<&DecisionRatiosYear> {
        self.ratios.iter().find(|r| r.year == year)
    }

    /// True once every edit has gone through a recalculation.
    pub fn is_current(&self) -> bool {
        self.last_recalculated_at.is_some() && self.stale_years.is_empty()
    }

    pub fn get_field(&self, year: FiscalYear, field: StatementField) -> PlanFinanceResult<Money> {
        let idx = self.require_year(year)?;
        let value = match field {
            StatementField::IncomeStatement(f) => self.income_statements[idx].get(f),
            StatementField::Assets(f) => self.assets[idx].get(f),
            StatementField::Liabilities(f) => self.liabilities[idx].get(f),
        };
        Ok(value)
    }

    /// Set one raw amount. Rejects negative values, unknown years and field
    /// names that do not belong to `kind`. Marks `year` stale on success.
    pub fn set_field(
        &mut self,
        year: FiscalYear,
        kind: StatementKind,
        field_name: &str,
        value: Money,
    ) -> PlanFinanceResult<()> {
        let field = StatementField::resolve(kind, field_name)?;
        self.set_resolved_field(year, field, value)
    }

    pub fn set_resolved_field(
        &mut self,
        year: FiscalYear,
        field: StatementField,
        value: Money,
    ) -> PlanFinanceResult<()> {
        if value < Decimal::ZERO {
            return Err(PlanFinanceError::validation(
                field.key(),
                format!("Amount cannot be negative (got {value})."),
            ));
        }
        let idx = self.require_year(year)?;
        let slot = match field {
            StatementField::IncomeStatement(f) => self.income_statements[idx].field_mut(f),
            StatementField::Assets(f) => self.assets[idx].field_mut(f),
            StatementField::Liabilities(f) => self.liabilities[idx].field_mut(f),
        };
        *slot = value;
        self.stale_years.insert(year);
        tracing::debug!(year, statement = %field.kind(), field = field.key(), %value, "statement field updated");
        Ok(())
    }

    /// Index of `year`, checked against all three raw sequences so the
    /// caller can index each of them directly.
    fn require_year(&self, year: FiscalYear) -> PlanFinanceResult<usize> {
        let idx = self.year_index(year).ok_or_else(|| {
            PlanFinanceError::validation(
                "year",
                format!(
                    "Fiscal year {year} is not in the series {}-{}.",
                    self.period_start_year, self.period_end_year
                ),
            )
        })?;
        let aligned = self.assets.get(idx).map(|r| r.year) == Some(year)
            && self.liabilities.get(idx).map(|r| r.year) == Some(year);
        if !aligned {
            return Err(PlanFinanceError::validation(
                "series",
                format!("Balance-sheet records for {year} are missing or out of order."),
            ));
        }
        Ok(idx)
    }

    /// Structural checks on the raw series: equal lengths, aligned and
    /// consecutive years, matching period bounds, non-negative amounts.
    pub fn validate(&self) -> PlanFinanceResult<()> {
        let n = self.income_statements.len();
        if n == 0 {
            return Err(PlanFinanceError::validation(
                "income_statements",
                "At least one fiscal year is required.",
            ));
        }
        if self.assets.len() != n || self.liabilities.len() != n {
            return Err(PlanFinanceError::validation(
                "series",
                format!(
                    "Statement sequences differ in length (income {n}, assets {}, liabilities {}).",
                    self.assets.len(),
                    self.liabilities.len()
                ),
            ));
        }

        for i in 0..n {
            let year = self.income_statements[i].year;
            if self.assets[i].year != year || self.liabilities[i].year != year {
                return Err(PlanFinanceError::validation(
                    "year",
                    format!(
                        "Records at position {i} are not aligned (income {year}, assets {}, liabilities {}).",
                        self.assets[i].year, self.liabilities[i].year
                    ),
                ));
            }
            if i > 0 {
                let prev = self.income_statements[i - 1].year;
                if prev.checked_add(1) != Some(year) {
                    return Err(PlanFinanceError::validation(
                        "year",
                        format!("Fiscal years must be consecutive ({prev} followed by {year})."),
                    ));
                }
            }
        }

        let first = self.income_statements[0].year;
        let last = self.income_statements[n - 1].year;
        if self.period_start_year != first || self.period_end_year != last {
            return Err(PlanFinanceError::validation(
                "period",
                format!(
                    "Period {}-{} does not match the recorded years {first}-{last}.",
                    self.period_start_year, self.period_end_year
                ),
            ));
        }

        for i in 0..n {
            let records = YearRecords {
                income_statement: &self.income_statements[i],
                assets: &self.assets[i],
                liabilities: &self.liabilities[i],
            };
            check_non_negative(&records)?;
        }
        Ok(())
    }
}

fn check_non_negative(records: &YearRecords<'_>) -> PlanFinanceResult<()> {
    let year = records.year();
    let amounts = IncomeStatementField::ALL
        .iter()
        .map(|f| (f.key(), records.income_statement.get(*f)))
        .chain(AssetField::ALL.iter().map(|f| (f.key(), records.assets.get(*f))))
        .chain(
            LiabilityField::ALL
                .iter()
                .map(|f| (f.key(), records.liabilities.get(*f))),
        );
    for (key, value) in amounts {
        if value < Decimal::ZERO {
            return Err(PlanFinanceError::validation(
                key,
                format!("Amount for {year} cannot be negative (got {value})."),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_initialize_three_blank_years() {
        let a = initialize(3, 2021).unwrap();
        assert_eq!(a.years(), vec![2021, 2022, 2023]);
        assert_eq!(a.period_start_year, 2021);
        assert_eq!(a.period_end_year, 2023);
        assert_eq!(a.working_capital.len(), 3);
        assert_eq!(a.ratios.len(), 3);
        assert!(a.income_statements.iter().all(|r| r.revenue.is_zero()));
        assert!(a.last_recalculated_at.is_none());
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_initialize_zero_years_rejected() {
        assert!(matches!(
            initialize(0, 2021),
            Err(PlanFinanceError::Validation { .. })
        ));
    }

    #[test]
    fn test_initialize_caps_year_count() {
        assert_eq!(initialize(MAX_YEAR_COUNT, 2000).unwrap().year_count(), MAX_YEAR_COUNT);
        assert!(matches!(
            initialize(MAX_YEAR_COUNT + 1, 2000),
            Err(PlanFinanceError::Validation { .. })
        ));
        assert!(matches!(
            initialize(1_000_000_000, 2000),
            Err(PlanFinanceError::Validation { .. })
        ));
    }

    #[test]
    fn test_initialize_for_project_seeds_next_years() {
        let a = initialize_for_project("p-1", "u-1", 2024).unwrap();
        assert_eq!(a.years(), vec![2025, 2026, 2027]);
        assert_eq!(a.project_id, "p-1");
        assert_eq!(a.owner_id, "u-1");
    }

    #[test]
    fn test_set_field_accepts_camel_and_snake_case() {
        let mut a = initialize(3, 2021).unwrap();
        a.set_field(2022, StatementKind::IncomeStatement, "rawMaterialPurchases", dec!(500))
            .unwrap();
        a.set_field(2022, StatementKind::Liabilities, "bank_overdraft", dec!(75))
            .unwrap();
        assert_eq!(a.income_statements[1].raw_material_purchases, dec!(500));
        assert_eq!(a.liabilities[1].bank_overdraft, dec!(75));
        assert_eq!(a.stale_years.iter().copied().collect::<Vec<_>>(), vec![2022]);
    }

    #[test]
    fn test_set_field_negative_rejected() {
        let mut a = initialize(3, 2021).unwrap();
        let err = a
            .set_field(2021, StatementKind::IncomeStatement, "revenue", dec!(-1))
            .unwrap_err();
        match err {
            PlanFinanceError::Validation { field, .. } => assert_eq!(field, "revenue"),
            other => panic!("Expected Validation, got {other:?}"),
        }
        assert!(a.stale_years.is_empty());
    }

    #[test]
    fn test_set_field_unknown_year_rejected() {
        let mut a = initialize(3, 2021).unwrap();
        let err = a
            .set_field(2030, StatementKind::Assets, "tangible_assets", dec!(10))
            .unwrap_err();
        match err {
            PlanFinanceError::Validation { field, .. } => assert_eq!(field, "year"),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_set_field_wrong_statement_rejected() {
        let mut a = initialize(3, 2021).unwrap();
        // revenue is an income-statement field
        let err = a
            .set_field(2021, StatementKind::Assets, "revenue", dec!(10))
            .unwrap_err();
        assert!(matches!(err, PlanFinanceError::Validation { .. }));
    }

    #[test]
    fn test_statement_kind_parsing() {
        assert_eq!(
            "incomeStatement".parse::<StatementKind>().unwrap(),
            StatementKind::IncomeStatement
        );
        assert_eq!("income".parse::<StatementKind>().unwrap(), StatementKind::IncomeStatement);
        assert_eq!("ASSETS".parse::<StatementKind>().unwrap(), StatementKind::Assets);
        assert!("cash_flow".parse::<StatementKind>().is_err());
    }

    #[test]
    fn test_validate_rejects_gap_in_years() {
        let mut a = initialize(3, 2021).unwrap();
        a.income_statements[2].year = 2024;
        a.assets[2].year = 2024;
        a.liabilities[2].year = 2024;
        a.period_end_year = 2024;
        let err = a.validate().unwrap_err();
        assert!(err.to_string().contains("consecutive"));
    }

    #[test]
    fn test_validate_rejects_misaligned_records() {
        let mut a = initialize(3, 2021).unwrap();
        a.assets[1].year = 2030;
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let mut a = initialize(3, 2021).unwrap();
        a.liabilities.pop();
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_edit_on_truncated_liabilities_is_rejected() {
        let mut a = initialize(3, 2021).unwrap();
        a.liabilities.pop();
        let json = serde_json::to_string(&a).unwrap();
        let mut loaded: HistoricalFinancialAnalysis = serde_json::from_str(&json).unwrap();

        let err = loaded
            .set_field(2023, StatementKind::Liabilities, "bank_overdraft", dec!(1))
            .unwrap_err();
        assert!(matches!(err, PlanFinanceError::Validation { .. }));
        assert!(loaded.stale_years.is_empty());

        let field = StatementField::resolve(StatementKind::Liabilities, "bankOverdraft").unwrap();
        assert!(matches!(
            loaded.get_field(2023, field),
            Err(PlanFinanceError::Validation { .. })
        ));
        // Years present in all three sequences stay editable.
        loaded
            .set_field(2022, StatementKind::Liabilities, "bank_overdraft", dec!(1))
            .unwrap();
    }

    #[test]
    fn test_validate_rejects_negative_loaded_amount() {
        let mut a = initialize(3, 2021).unwrap();
        a.assets[0].cash_and_equivalents = dec!(-5);
        let err = a.validate().unwrap_err();
        match err {
            PlanFinanceError::Validation { field, .. } => assert_eq!(field, "cash_and_equivalents"),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_get_field_by_year() {
        let mut a = initialize(3, 2021).unwrap();
        let field = StatementField::resolve(StatementKind::Liabilities, "netIncome").unwrap();
        a.set_resolved_field(2023, field, dec!(42)).unwrap();
        assert_eq!(a.get_field(2023, field).unwrap(), dec!(42));
        assert_eq!(a.get_field(2021, field).unwrap(), Decimal::ZERO);
    }
}
