//! Computed fields that share the single cleaning pass with the categorical
//! rules. Unparsable input yields `None`, never an error.

use super::is_missing;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBracket {
    UpTo12k,
    UpTo47k,
    UpTo100k,
    Above100k,
}

impl IncomeBracket {
    pub const fn ordered() -> [Self; 4] {
        [Self::UpTo12k, Self::UpTo47k, Self::UpTo100k, Self::Above100k]
    }

    /// Buckets an annualized income. Upper bounds are inclusive.
    pub fn for_annual_income(annual: f64) -> Option<Self> {
        if !annual.is_finite() {
            return None;
        }

        let bracket = if annual <= 12_000.0 {
            Self::UpTo12k
        } else if annual <= 47_000.0 {
            Self::UpTo47k
        } else if annual <= 100_000.0 {
            Self::UpTo100k
        } else {
            Self::Above100k
        };
        Some(bracket)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UpTo12k => "$0\u{2013}$12,000",
            Self::UpTo47k => "$12,001\u{2013}$47,000",
            Self::UpTo100k => "$47,001\u{2013}$100,000",
            Self::Above100k => "$100,000+",
        }
    }
}

pub fn annualize_monthly(monthly: f64) -> f64 {
    monthly * 12.0
}

/// Collapses the free-text ethnicity answer to `Yes`/`No`.
pub fn hispanic_flag(raw: Option<&str>) -> Option<&'static str> {
    match raw {
        Some(value) if !is_missing(Some(value)) => {
            if value.to_lowercase().contains("non") {
                Some("No")
            } else {
                Some("Yes")
            }
        }
        _ => None,
    }
}

/// Lenient numeric parse: tolerates currency symbols, thousands separators
/// and surrounding whitespace.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
// Two-digit years are tried first: `%Y` would read "24" as year 24.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%Y/%m/%d"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Calendar days from `start` to `end`; negative when `end` is earlier.
pub fn days_between(end: &str, start: &str) -> Option<i64> {
    let end = parse_date(end)?;
    let start = parse_date(start)?;
    Some(elapsed_days(end, start))
}

pub fn elapsed_days(end: NaiveDate, start: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn year_of(date: NaiveDate) -> i64 {
    i64::from(date.year())
}
