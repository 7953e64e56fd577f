//! Admission cycle behaviour against a real engine and risk gate.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use simtrade_admission::{AdmissionConfig, AdmissionOutcome, SignalPool};
use simtrade_core::{Price, Quote, Signal};
use simtrade_engine::{AccountHandle, EngineConfig, OrderEngine};
use simtrade_ledger::AccountConfig;
use simtrade_risk::{RiskConfig, RiskControlManager};

fn px(v: Decimal) -> Price {
    Price::new(v)
}

fn engine() -> OrderEngine {
    OrderEngine::new(EngineConfig::default(), AccountConfig::default())
}

#[test]
fn test_higher_scores_admitted_first_regardless_of_insertion_order() {
    let orders: [[(&str, f64); 3]; 3] = [
        [("600001", 95.0), ("600002", 75.0), ("600003", 85.0)],
        [("600002", 75.0), ("600003", 85.0), ("600001", 95.0)],
        [("600003", 85.0), ("600002", 75.0), ("600001", 95.0)],
    ];

    for batch in orders {
        let mut engine = engine();
        let risk = RiskControlManager::default();
        let mut pool = SignalPool::new();
        for (symbol, score) in batch {
            pool.add_signal(symbol, score, px(dec!(10)), 100, "test");
        }

        let summary = pool.execute_signals(&mut engine, &risk, 2, dec!(0.2), Utc::now());

        assert_eq!(summary.admitted_symbols(), vec!["600001", "600003"]);
        assert_eq!(
            summary.detail("600002").unwrap().outcome,
            AdmissionOutcome::RejectedPositionLimit
        );
        assert_eq!(summary.executed, 2);
        assert_eq!(summary.rejected, 1);
    }
}

#[test]
fn test_ties_keep_insertion_order() {
    let mut engine = engine();
    let risk = RiskControlManager::default();
    let mut pool = SignalPool::new();
    pool.add_signal("600010", 80.0, px(dec!(10)), 100, "first");
    pool.add_signal("600011", 80.0, px(dec!(10)), 100, "second");

    let summary = pool.execute_signals(&mut engine, &risk, 1, dec!(0.2), Utc::now());
    assert_eq!(summary.admitted_symbols(), vec!["600010"]);
}

#[test]
fn test_scenario_veto_precedes_capital_and_position_checks() {
    // No capital at all: any capital check would say exhausted
    let mut engine = OrderEngine::new(
        EngineConfig::default(),
        AccountConfig::default().with_capital(Decimal::ZERO),
    );
    let risk = RiskControlManager::default();
    let mut pool = SignalPool::new();
    pool.add_tagged_signal("600000", 100.0, px(dec!(10)), 1_000, "hot", "pump_and_dump");
    pool.add_signal("000001", 50.0, px(dec!(10)), 1_000, "plain");

    // Zero admissions allowed this cycle as well
    let summary = pool.execute_signals(&mut engine, &risk, 0, dec!(0.5), Utc::now());

    let vetoed = summary.detail("600000").unwrap();
    assert_eq!(vetoed.outcome, AdmissionOutcome::RejectedRiskVeto);
    assert!(vetoed.reason.contains("pump_and_dump"));
    assert_eq!(
        summary.detail("000001").unwrap().outcome,
        AdmissionOutcome::RejectedPositionLimit
    );
}

#[test]
fn test_open_position_blocks_new_signal() {
    let handle = AccountHandle::from_config(EngineConfig::default(), AccountConfig::default());
    let risk = RiskControlManager::default();
    let config = AdmissionConfig::default();
    let now = Utc::now();

    let mut pool = SignalPool::new();
    pool.add_signal("600000", 90.0, px(dec!(10)), 1_000, "entry");
    let summary = pool.execute(&handle, &risk, &config, now);
    let order_id = summary.details[0].order_id.unwrap();
    handle
        .fill(order_id, &Quote::new("600000", px(dec!(10)), now), now)
        .unwrap();

    pool.add_signal("600000", 99.0, px(dec!(10.2)), 1_000, "average up");
    let summary = pool.execute(&handle, &risk, &config, now);
    let detail = summary.detail("600000").unwrap();
    assert_eq!(detail.outcome, AdmissionOutcome::RejectedDuplicatePosition);
    assert_eq!(detail.reason, "position already open");
}

#[test]
fn test_holdings_limit_counts_existing_positions() {
    let mut engine = engine();
    let risk = RiskControlManager::new(RiskConfig {
        max_holdings: 2,
        ..Default::default()
    });
    let mut pool = SignalPool::new();
    for symbol in ["600001", "600002", "600003"] {
        pool.add_signal(symbol, 90.0, px(dec!(10)), 100, "test");
    }

    let summary = pool.execute_signals(&mut engine, &risk, 5, dec!(0.2), Utc::now());
    assert_eq!(summary.executed, 2);
    let third = summary.detail("600003").unwrap();
    assert_eq!(third.outcome, AdmissionOutcome::RejectedPositionLimit);
    assert!(third.reason.contains("max 2"));
}

#[test]
fn test_end_to_end_capital_recomputed_after_each_admission() {
    let mut engine = engine();
    let risk = RiskControlManager::default();
    let mut pool = SignalPool::new();
    pool.push(Signal::new("600100", 90.0, px(dec!(10)), 1_000, "X"));
    pool.push(Signal::new("600200", 80.0, px(dec!(10)), 1_000, "Y"));

    let summary = pool.execute_signals(&mut engine, &risk, 5, dec!(0.5), Utc::now());

    assert_eq!(summary.details.len(), 2);
    assert_eq!(summary.executed, 2);
    assert!(summary
        .details
        .iter()
        .all(|d| d.outcome == AdmissionOutcome::Admitted || !d.reason.is_empty()));

    let x = summary.detail("600100").unwrap();
    let x_cost = engine.estimated_cost(x.price, x.quantity);
    assert!(x.price.notional(x.quantity) <= dec!(50000));

    let remaining_after_x = dec!(100000) - x_cost;
    let y = summary.detail("600200").unwrap();
    assert!(y.price.notional(y.quantity) <= remaining_after_x * dec!(0.5));

    assert_eq!(
        summary.remaining_capital,
        remaining_after_x - engine.estimated_cost(y.price, y.quantity)
    );
    assert_eq!(engine.pending_order_count(), 2);
}

#[test]
fn test_pool_is_drained_after_cycle() {
    let mut engine = engine();
    let risk = RiskControlManager::default();
    let mut pool = SignalPool::new();
    pool.add_signal("600000", 90.0, px(dec!(10)), 100, "test");
    assert_eq!(pool.len(), 1);

    pool.execute_signals(&mut engine, &risk, 5, dec!(0.2), Utc::now());
    assert!(pool.is_empty());

    let summary = pool.execute_signals(&mut engine, &risk, 5, dec!(0.2), Utc::now());
    assert_eq!(summary.details.len(), 0);
}
