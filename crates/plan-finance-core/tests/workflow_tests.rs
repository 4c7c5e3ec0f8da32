use chrono::{TimeZone, Utc};
use plan_finance_core::historical::{
    build_report, initialize_for_project, recalculate_all, StatementKind, Tier,
};
use plan_finance_core::storage::{AnalysisStore, MemoryStore};
use plan_finance_core::{EngineConfig, PlanFinanceError};
use rust_decimal_macros::dec;

// ===========================================================================
// Form → save → report flow
// ===========================================================================

#[test]
fn test_create_edit_save_report() {
    let cfg = EngineConfig::default();
    let mut store = MemoryStore::new();
    let project = "atelier-couture-thies";

    // No analysis yet: seed one.
    let mut analysis = match store.load(project).unwrap() {
        Some(a) => a,
        None => initialize_for_project(project, "owner-1", 2023).unwrap(),
    };
    assert_eq!(analysis.years(), vec![2024, 2025, 2026]);

    analysis
        .set_field(2024, StatementKind::IncomeStatement, "revenue", dec!(12_000_000))
        .unwrap();
    analysis
        .set_field(2024, StatementKind::IncomeStatement, "personnel_costs", dec!(9_000_000))
        .unwrap();
    analysis
        .set_field(2024, StatementKind::Assets, "tangible_assets", dec!(4_000_000))
        .unwrap();
    analysis
        .set_field(2024, StatementKind::Assets, "cash_and_equivalents", dec!(1_000_000))
        .unwrap();
    analysis
        .set_field(2024, StatementKind::Liabilities, "share_capital", dec!(2_000_000))
        .unwrap();
    analysis
        .set_field(2024, StatementKind::Liabilities, "net_income", dec!(3_000_000))
        .unwrap();

    let saved_at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
    let recalculated = recalculate_all(&analysis, saved_at, &cfg).unwrap();
    let version = store.save(project, &recalculated).unwrap();
    assert_eq!(version, 1);

    let loaded = store.load(project).unwrap().unwrap();
    assert!(loaded.is_current());
    assert_eq!(loaded.version, 1);

    let report = build_report(&loaded, &cfg).unwrap();
    let y = report.result.year(2024).unwrap();
    assert!(y.balanced);
    // equity 5M over TLE 5M: autonomy 100%, solvency undefined
    assert!(y.ratios.iter().any(|r| r.tier == Tier::Undefined));
    assert_eq!(
        report.result.year(2025).unwrap().ratios[0].tier,
        Tier::Undefined
    );
}

#[test]
fn test_concurrent_editors_conflict() {
    let cfg = EngineConfig::default();
    let mut store = MemoryStore::new();
    let project = "p-concurrent";
    let seeded = initialize_for_project(project, "owner-1", 2023).unwrap();
    store.save(project, &seeded).unwrap();

    let mut alice = store.load(project).unwrap().unwrap();
    let mut bob = store.load(project).unwrap().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();

    alice
        .set_field(2024, StatementKind::IncomeStatement, "revenue", dec!(1_000))
        .unwrap();
    let alice = recalculate_all(&alice, at, &cfg).unwrap();
    assert_eq!(store.save(project, &alice).unwrap(), 2);

    bob.set_field(2025, StatementKind::IncomeStatement, "revenue", dec!(2_000))
        .unwrap();
    let bob = recalculate_all(&bob, at, &cfg).unwrap();
    assert!(matches!(
        store.save(project, &bob),
        Err(PlanFinanceError::VersionConflict { .. })
    ));

    let stored = store.load(project).unwrap().unwrap();
    assert_eq!(stored.income_statements[0].revenue, dec!(1_000));
    assert_eq!(stored.income_statements[1].revenue, dec!(0));
}
