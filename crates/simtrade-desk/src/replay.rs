//! File-driven session replay.
//!
//! A scenario is a list of sessions, each carrying previous closes, the
//! signals produced that day and the ticks seen by the feed.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use simtrade_admission::AdmissionSummary;
use simtrade_core::{phase_at, OrderId, Price, RawTick, Signal};
use simtrade_engine::FillResult;
use simtrade_ledger::AccountStatus;

use crate::desk::Desk;
use crate::error::{AppError, AppResult};
use crate::exits::ExitOrder;
use crate::feed::ReplayFeed;

// ============================================================================
// Scenario file
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub sessions: Vec<ScenarioSession>,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Scenario(format!("Failed to parse scenario: {e}")))
    }
}

/// One trading day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSession {
    pub date: NaiveDate,
    /// Exchange-local time at which the session's actions run.
    #[serde(default = "default_session_time")]
    pub time: NaiveTime,
    #[serde(default)]
    pub prev_close: BTreeMap<String, Price>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub ticks: Vec<ScenarioTick>,
}

fn default_session_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 35, 0).unwrap_or(NaiveTime::MIN)
}

impl ScenarioSession {
    /// Session clock as UTC. Times are treated as already in UTC.
    pub fn now(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(self.time))
    }
}

/// A tick relative to the session clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTick {
    pub code: String,
    pub last: String,
    #[serde(default = "default_phase")]
    pub phase: String,
    /// How old the tick is at session time.
    #[serde(default)]
    pub age_ms: i64,
    #[serde(default)]
    pub volume: Option<u64>,
}

fn default_phase() -> String {
    "continuous".to_string()
}

impl ScenarioTick {
    pub fn to_raw(&self, now: DateTime<Utc>) -> RawTick {
        RawTick {
            code: self.code.clone(),
            last: self.last.clone(),
            ts_ms: now.timestamp_millis() - self.age_ms,
            phase: self.phase.clone(),
            volume: self.volume,
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub date: NaiveDate,
    pub exits: Vec<ExitOrder>,
    pub admission: AdmissionSummary,
    pub fills_executed: usize,
    /// Fill attempts that did not execute (stale quote, limit not reached...).
    pub fills_skipped: usize,
    /// Orders made terminal by a failed fill.
    pub fills_rejected: usize,
    pub cancelled: Vec<OrderId>,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub run_id: Uuid,
    pub sessions: Vec<SessionReport>,
    pub final_status: AccountStatus,
}

// ============================================================================
// Runner
// ============================================================================

/// Replay every session of `scenario` through `desk`.
///
/// Sessions must be in strictly increasing date order.
pub async fn run_scenario(
    desk: &mut Desk<ReplayFeed>,
    scenario: &Scenario,
) -> AppResult<ReplayReport> {
    let mut reports = Vec::with_capacity(scenario.sessions.len());
    let mut last_date: Option<NaiveDate> = None;

    for session in &scenario.sessions {
        if let Some(prev) = last_date {
            if session.date <= prev {
                return Err(AppError::Scenario(format!(
                    "session {} does not follow {prev}",
                    session.date
                )));
            }
        }
        last_date = Some(session.date);
        reports.push(run_session(desk, session).await?);
    }

    let final_status = desk.snapshot();
    info!(
        run_id = %desk.run_id(),
        sessions = reports.len(),
        equity = %final_status.total_equity,
        realized_pnl = %final_status.realized_pnl,
        "Replay complete"
    );

    Ok(ReplayReport {
        run_id: desk.run_id(),
        sessions: reports,
        final_status,
    })
}

async fn run_session(
    desk: &mut Desk<ReplayFeed>,
    session: &ScenarioSession,
) -> AppResult<SessionReport> {
    let now = session.now();
    if phase_at(session.time).is_none() {
        warn!(date = %session.date, time = %session.time, "Session time is outside trading hours");
    }
    info!(date = %session.date, signals = session.signals.len(), ticks = session.ticks.len(), "Session started");

    let ticks: Vec<RawTick> = session.ticks.iter().map(|t| t.to_raw(now)).collect();
    desk.feed().clear();
    desk.feed().load(&ticks);
    desk.set_reference_prices(&session.prev_close)?;

    desk.mark_positions().await?;
    let exits = desk.scan_exits(session.date, now)?;
    let admission = desk.run_admission(session.signals.iter().cloned(), now);

    let fills = desk.fill_pending(now).await?;
    let fills_executed = fills.iter().filter(|f| f.is_executed()).count();
    let fills_rejected = fills
        .iter()
        .filter(|f| matches!(f, FillResult::Rejected { .. }))
        .count();
    let fills_skipped = fills.len() - fills_executed - fills_rejected;

    let cancelled = desk.end_session(now)?;

    Ok(SessionReport {
        date: session.date,
        exits,
        admission,
        fills_executed,
        fills_skipped,
        fills_rejected,
        cancelled,
        status: desk.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_defaults() {
        let scenario = Scenario::from_toml(
            r#"
            [[sessions]]
            date = "2026-02-09"

            [[sessions.ticks]]
            code = "600000.SH"
            last = "10.00"
            "#,
        )
        .unwrap();

        let session = &scenario.sessions[0];
        assert_eq!(session.time, default_session_time());
        assert_eq!(session.ticks[0].phase, "continuous");
        assert_eq!(session.ticks[0].age_ms, 0);

        let raw = session.ticks[0].to_raw(session.now());
        assert_eq!(raw.ts_ms, session.now().timestamp_millis());
    }

    #[test]
    fn test_bad_scenario_is_scenario_error() {
        assert!(matches!(
            Scenario::from_toml("[[sessions]]\ndate = \"not a date\""),
            Err(AppError::Scenario(_))
        ));
    }
}
