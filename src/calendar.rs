//! Calendar quarters and period-label parsing.
//!
//! Both input series express their periods differently: housing rows carry a
//! calendar month, unemployment rows carry a free-text quarter label such as
//! `"Jan-Mar 2020"`. Everything downstream works in whole quarters, so this
//! module owns the conversions between dates, quarters and labels.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Days between 0001-01-01 and 1970-01-01, for converting `chrono` dates
/// to and from epoch-day offsets (the physical representation of a polars
/// `Date` column).
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

static MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)([a-z]{3,9})\s+(\d{4})$").expect("valid month-year pattern"));

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A calendar quarter, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u32,
}

impl Quarter {
    pub fn new(year: i32, quarter: u32) -> Self {
        debug_assert!((1..=4).contains(&quarter));
        Self { year, quarter }
    }

    /// The quarter containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }

    /// The last calendar day of the quarter (Mar 31 / Jun 30 / Sep 30 / Dec 31).
    pub fn end_date(&self) -> NaiveDate {
        let month = self.quarter * 3;
        let day = match month {
            3 | 12 => 31,
            _ => 30,
        };
        NaiveDate::from_ymd_opt(self.year, month, day).expect("valid quarter-end date")
    }

    /// Display label, e.g. `"1995 Q1"`.
    pub fn label(&self) -> String {
        format!("{} Q{}", self.year, self.quarter)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Q{}", self.year, self.quarter)
    }
}

/// An inclusive range of quarters, derived from a pair of bounding dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterWindow {
    pub start: Quarter,
    pub end: Quarter,
}

impl QuarterWindow {
    pub fn new(start: Quarter, end: Quarter) -> Self {
        Self { start, end }
    }

    /// The window spanning the quarters of the two bounding dates.
    ///
    /// Comparing whole quarters rather than raw dates means a quarter-end
    /// date (2023-06-30) and a first-of-month date (2023-06-01) receive
    /// identical treatment from one bound pair.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Quarter::from_date(start),
            end: Quarter::from_date(end),
        }
    }

    pub fn contains(&self, quarter: Quarter) -> bool {
        self.start <= quarter && quarter <= self.end
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(Quarter::from_date(date))
    }
}

impl fmt::Display for QuarterWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ..= {}", self.start, self.end)
    }
}

/// Reduce a free-text quarter label to its quarter-end portion.
///
/// Labels shaped like `"Jan-Mar 2020"` reduce to `"Mar 2020"` (the
/// substring after the last hyphen, trimmed). Labels with no hyphen pass
/// through unchanged.
pub fn quarter_label_tail(raw: &str) -> &str {
    match raw.rfind('-') {
        Some(idx) => raw[idx + 1..].trim(),
        None => raw.trim(),
    }
}

/// Parse a free-text quarter label to the first day of its quarter-end month.
///
/// `"Jan-Mar 2020"` parses to 2020-03-01. Unparseable labels yield `None`
/// rather than an error; the caller prunes those rows later.
pub fn parse_quarter_label(raw: &str) -> Option<NaiveDate> {
    parse_period(quarter_label_tail(raw))
}

/// Parse a period string as an ISO date, falling back to month-name + year.
pub fn parse_period(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_month_year(trimmed))
}

/// Parse `"Mar 2020"` (or `"March 2020"`) to 2020-03-01.
fn parse_month_year(raw: &str) -> Option<NaiveDate> {
    let captures = MONTH_YEAR_RE.captures(raw)?;
    let name = captures.get(1)?.as_str().to_ascii_lowercase();
    let year: i32 = captures.get(2)?.as_str().parse().ok()?;

    let month = MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| name.starts_with(abbr))
        .map(|idx| idx as u32 + 1)?;

    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Days since 1970-01-01 for a date (the polars `Date` physical value).
pub fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// The date for an epoch-day offset.
pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}
