//! Multi-session replay through the desk.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use simtrade_admission::AdmissionOutcome;
use simtrade_core::{Price, RawTick, Signal};
use simtrade_desk::{run_scenario, AppConfig, AppError, Desk, ReplayFeed, Scenario};
use simtrade_risk::ExitReason;

const DEMO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/scenario_demo.toml");

fn desk() -> Desk<ReplayFeed> {
    Desk::new(&AppConfig::default(), ReplayFeed::new()).unwrap()
}

#[tokio::test]
async fn test_demo_scenario_enters_then_exits_by_price_and_time() {
    let scenario = Scenario::from_file(DEMO).unwrap();
    let mut desk = desk();

    let report = run_scenario(&mut desk, &scenario).await.unwrap();
    assert_eq!(report.sessions.len(), 3);

    let monday = &report.sessions[0];
    assert_eq!(monday.admission.executed, 2);
    assert_eq!(
        monday.admission.detail("300750").unwrap().outcome,
        AdmissionOutcome::RejectedRiskVeto
    );
    // Highest score is vetoed, so the main-board signals go first
    assert_eq!(monday.admission.admitted_symbols(), vec!["600000", "000001"]);
    assert_eq!(monday.fills_executed, 2);
    assert!(monday.exits.is_empty());
    assert_eq!(monday.status.position_count, 2);

    let tuesday = &report.sessions[1];
    assert_eq!(tuesday.exits.len(), 1);
    assert_eq!(tuesday.exits[0].symbol, "600000");
    assert_eq!(tuesday.exits[0].reason, ExitReason::PriceStop);
    assert_eq!(tuesday.exits[0].quantity, 1_000);
    assert_eq!(tuesday.fills_executed, 1);
    assert_eq!(tuesday.status.position_count, 1);

    let next_monday = &report.sessions[2];
    assert_eq!(next_monday.exits.len(), 1);
    assert_eq!(next_monday.exits[0].symbol, "000001");
    assert_eq!(next_monday.exits[0].reason, ExitReason::TimeStop);

    let status = &report.final_status;
    assert_eq!(status.position_count, 0);
    assert_eq!(status.pending_order_count, 0);
    assert_eq!(status.session, 3);
    assert_eq!(status.total_equity, status.cash_balance);
    assert!(status.cash_balance < dec!(100000));
    assert_eq!(report.run_id, desk.run_id());
}

#[tokio::test]
async fn test_same_session_buy_cannot_be_exited() {
    let mut desk = desk();
    let now = Utc.with_ymd_and_hms(2026, 2, 9, 9, 35, 0).unwrap();
    let tick = |last: &str| RawTick {
        code: "600000".to_string(),
        last: last.to_string(),
        ts_ms: now.timestamp_millis(),
        phase: "continuous".to_string(),
        volume: None,
    };

    desk.run_admission(
        vec![Signal::new("600000", 90.0, Price::new(dec!(10)), 1_000, "entry")],
        now,
    );
    desk.feed().load(&[tick("10.00")]);
    assert_eq!(desk.fill_pending(now).await.unwrap().len(), 1);

    // Collapse within the same session: the stop fires but nothing is sellable
    desk.feed().load(&[tick("9.00")]);
    assert_eq!(desk.mark_positions().await.unwrap(), 1);
    let exits = desk.scan_exits(now.date_naive(), now).unwrap();
    assert!(exits.is_empty());

    desk.end_session(now).unwrap();
    let exits = desk.scan_exits(now.date_naive(), now).unwrap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].reason, ExitReason::PriceStop);
}

#[tokio::test]
async fn test_stale_quote_leaves_order_pending_until_close() {
    let scenario = Scenario::from_toml(
        r#"
        [[sessions]]
        date = "2026-02-09"

        [[sessions.signals]]
        symbol = "600000"
        score = 90.0
        suggested_price = "10.00"
        suggested_quantity = 1000

        [[sessions.ticks]]
        code = "600000"
        last = "10.00"
        age_ms = 60000
        "#,
    )
    .unwrap();
    let mut desk = desk();
    let report = run_scenario(&mut desk, &scenario).await.unwrap();

    let session = &report.sessions[0];
    assert_eq!(session.admission.executed, 1);
    assert_eq!(session.fills_executed, 0);
    assert_eq!(session.fills_skipped, 1);
    assert_eq!(session.cancelled.len(), 1);
    assert_eq!(session.status.position_count, 0);
    assert_eq!(session.status.cash_balance, dec!(100000));
    assert_eq!(session.status.available_cash, dec!(100000));
}

#[tokio::test]
async fn test_auction_quote_is_exempt_from_staleness() {
    let scenario = Scenario::from_toml(
        r#"
        [[sessions]]
        date = "2026-02-09"
        time = "09:20:00"

        [[sessions.signals]]
        symbol = "600000"
        score = 90.0
        suggested_price = "10.00"
        suggested_quantity = 1000

        [[sessions.ticks]]
        code = "600000"
        last = "10.00"
        phase = "call_auction"
        age_ms = 600000
        "#,
    )
    .unwrap();
    let mut desk = desk();
    let report = run_scenario(&mut desk, &scenario).await.unwrap();
    assert_eq!(report.sessions[0].fills_executed, 1);
    assert_eq!(report.final_status.position_count, 1);
}

#[tokio::test]
async fn test_sessions_out_of_order_are_refused() {
    let scenario = Scenario::from_toml(
        r#"
        [[sessions]]
        date = "2026-02-10"

        [[sessions]]
        date = "2026-02-09"
        "#,
    )
    .unwrap();
    let mut desk = desk();
    assert!(matches!(
        run_scenario(&mut desk, &scenario).await,
        Err(AppError::Scenario(_))
    ));
}
