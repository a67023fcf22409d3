//! Period calendar: day, ISO-week and month keys.
//!
//! Every function here is pure. Keys are parsed strictly: anything that does
//! not round-trip back to the same string is rejected with `InvalidPeriod`.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::Tier;
use crate::error::{LoopcycleError, Result};

/// Which way to step through periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// `YYYY-MM-DD`
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM`
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// ISO-8601 week key `YYYY-Www`.
///
/// The year is the ISO week-year, so 2027-01-01 maps to `2026-W53` when that
/// week started in 2026.
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Number of ISO weeks (52 or 53) in `year`.
///
/// December 28th always falls in the last ISO week of its year.
pub fn iso_week_count(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

/// Key of the period containing `date` for the given tier
pub fn period_key(date: NaiveDate, tier: Tier) -> String {
    match tier {
        Tier::Daily => day_key(date),
        Tier::Weekly => iso_week_key(date),
        Tier::Monthly => month_key(date),
    }
}

/// Parse a `YYYY-MM-DD` key
pub fn parse_day(key: &str) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|e| LoopcycleError::InvalidPeriod(format!("day key '{}': {}", key, e)))?;
    if day_key(date) != key {
        return Err(LoopcycleError::InvalidPeriod(format!(
            "day key '{}' is not in YYYY-MM-DD form",
            key
        )));
    }
    Ok(date)
}

/// Parse a `YYYY-MM` key into (year, month)
pub fn parse_month(key: &str) -> Result<(i32, u32)> {
    let invalid = || LoopcycleError::InvalidPeriod(format!("month key '{}'", key));
    let (y, m) = key.split_once('-').ok_or_else(invalid)?;
    if y.len() != 4 || m.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Parse a `YYYY-Www` key into (ISO year, week)
pub fn parse_week(key: &str) -> Result<(i32, u32)> {
    let invalid = || LoopcycleError::InvalidPeriod(format!("week key '{}'", key));
    let (y, w) = key.split_once("-W").ok_or_else(invalid)?;
    if y.len() != 4 || w.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let week: u32 = w.parse().map_err(|_| invalid())?;
    if week == 0 || week > iso_week_count(year) {
        return Err(invalid());
    }
    Ok((year, week))
}

/// Check that `key` is a well-formed period of `tier`'s granularity
pub fn validate_key(tier: Tier, key: &str) -> Result<()> {
    match tier {
        Tier::Daily => parse_day(key).map(|_| ()),
        Tier::Weekly => parse_week(key).map(|_| ()),
        Tier::Monthly => parse_month(key).map(|_| ()),
    }
}

/// Monday of the given ISO week
pub fn week_start(week_key: &str) -> Result<NaiveDate> {
    let (year, week) = parse_week(week_key)?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| LoopcycleError::InvalidPeriod(format!("week key '{}' is out of range", week_key)))
}

/// Month key of the month containing the week's Monday
pub fn month_of_week(week_key: &str) -> Result<String> {
    week_start(week_key).map(month_key)
}

/// Previous or next period key for `tier`
pub fn neighbor(key: &str, tier: Tier, direction: Direction) -> Result<String> {
    match tier {
        Tier::Daily => {
            let date = parse_day(key)?;
            let stepped = match direction {
                Direction::Prev => date.pred_opt(),
                Direction::Next => date.succ_opt(),
            };
            stepped
                .map(day_key)
                .ok_or_else(|| LoopcycleError::InvalidPeriod(format!("day key '{}' has no neighbor", key)))
        }
        Tier::Weekly => {
            let (year, week) = parse_week(key)?;
            let (year, week) = match direction {
                Direction::Prev if week == 1 => (year - 1, iso_week_count(year - 1)),
                Direction::Prev => (year, week - 1),
                Direction::Next if week == iso_week_count(year) => (year + 1, 1),
                Direction::Next => (year, week + 1),
            };
            Ok(format!("{:04}-W{:02}", year, week))
        }
        Tier::Monthly => {
            let (year, month) = parse_month(key)?;
            let (year, month) = match direction {
                Direction::Prev if month == 1 => (year - 1, 12),
                Direction::Prev => (year, month - 1),
                Direction::Next if month == 12 => (year + 1, 1),
                Direction::Next => (year, month + 1),
            };
            Ok(format!("{:04}-{:02}", year, month))
        }
    }
}
