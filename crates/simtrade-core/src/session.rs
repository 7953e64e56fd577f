//! Trading session utilities.
//!
//! Provides trading-day arithmetic and intraday phase classification.
//! Used for:
//! - Holding-period measurement in time-stop exits
//! - Classifying exchange-local times into auction / continuous phases
//!
//! Exchange holidays are not modelled; every weekday is a trading day.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

use crate::quote::SessionPhase;

/// Whether `date` is a trading day (Monday–Friday).
#[must_use]
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of trading days after `entry` up to and including `current`.
///
/// Returns None if `current` precedes `entry`. Same day is zero.
#[must_use]
pub fn trading_days_between(entry: NaiveDate, current: NaiveDate) -> Option<i64> {
    if current < entry {
        return None;
    }

    let total = (current - entry).num_days();
    let full_weeks = total / 7;
    let mut days = full_weeks * 5;

    let mut cursor = entry + chrono::Duration::days(full_weeks * 7);
    while cursor < current {
        cursor += chrono::Duration::days(1);
        if is_trading_day(cursor) {
            days += 1;
        }
    }

    Some(days)
}

/// Classify an exchange-local time of day.
///
/// - 09:15 – 09:25: opening call auction
/// - 09:30 – 11:30 and 13:00 – 15:00: continuous trading
/// - anything else: market closed (None)
#[must_use]
pub fn phase_at(time: NaiveTime) -> Option<SessionPhase> {
    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);

    if time >= hm(9, 15) && time < hm(9, 25) {
        return Some(SessionPhase::Auction);
    }
    if (time >= hm(9, 30) && time < hm(11, 30)) || (time >= hm(13, 0) && time < hm(15, 0)) {
        return Some(SessionPhase::Continuous);
    }
    None
}
