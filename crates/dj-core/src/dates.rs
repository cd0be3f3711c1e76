//! Diary-day helpers shared by the service, the statistics engine and the UI.
//!
//! A diary day is the UTC calendar date of the server clock.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::{AppError, Result};

pub const DIARY_DAY_FORMAT: &str = "%Y-%m-%d";

/// Source of "now". Every date policy reads the server clock through this.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Noon UTC on the given day.
    pub fn on(day: NaiveDate) -> Self {
        let noon = day.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self(noon.and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parses a strict `YYYY-MM-DD` diary day.
pub fn parse_diary_day(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 10 {
        return Err(AppError::invalid(format!("invalid date: {raw}")));
    }
    NaiveDate::parse_from_str(raw, DIARY_DAY_FORMAT)
        .map_err(|_| AppError::invalid(format!("invalid date: {raw}")))
}

pub fn format_diary_day(day: NaiveDate) -> String {
    day.format(DIARY_DAY_FORMAT).to_string()
}

/// `October 18, 2026`
pub fn format_long_date(day: NaiveDate) -> String {
    day.format("%B %-d, %Y").to_string()
}

/// `Oct 18`
pub fn format_short_date(day: NaiveDate) -> String {
    day.format("%b %-d").to_string()
}

/// The `n` days ending at `today`, oldest first.
pub fn days_back(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..i64::from(n))
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_strict_diary_days() {
        assert_eq!(parse_diary_day("2026-10-18").unwrap(), day(2026, 10, 18));
        assert!(parse_diary_day("2026-1-8").is_err());
        assert!(parse_diary_day("2026-02-30").is_err());
        assert!(parse_diary_day("yesterday").is_err());
    }

    #[test]
    fn days_back_is_oldest_first_and_ends_today() {
        let days = days_back(day(2026, 3, 2), 3);
        assert_eq!(days, vec![day(2026, 2, 28), day(2026, 3, 1), day(2026, 3, 2)]);
        assert!(days_back(day(2026, 3, 2), 0).is_empty());
    }

    #[test]
    fn fixed_clock_today() {
        let clock = FixedClock::on(day(2026, 10, 18));
        assert_eq!(clock.today(), day(2026, 10, 18));
    }

    #[test]
    fn long_and_short_formats() {
        assert_eq!(format_long_date(day(2026, 10, 8)), "October 8, 2026");
        assert_eq!(format_short_date(day(2026, 10, 8)), "Oct 8");
        assert_eq!(format_diary_day(day(2026, 1, 5)), "2026-01-05");
    }
}
