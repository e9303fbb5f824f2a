//! Release-date parsing for review batches.
//!
//! The open-data exports use two shapes, `Jun-09` and `January 2010`. Anything else has
//! no date and is left out of time-based ordering and aggregation.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

static SHORT_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{3})-(\d{2})$").expect("valid regex"));
static LONG_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)\s+(\d{4})$").expect("valid regex"));

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// First day of the release month, or `None` for an unsupported format.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(caps) = SHORT_MONTH.captures(raw) {
        let month = short_month_index(&caps[1])?;
        let year = 2000 + caps[2].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month + 1, 1);
    }

    if let Some(caps) = LONG_MONTH.captures(raw) {
        let month = long_month_index(&caps[1])?;
        let year = caps[2].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month + 1, 1);
    }

    None
}

fn short_month_index(abbrev: &str) -> Option<u32> {
    let abbrev = abbrev.to_lowercase();
    MONTHS
        .iter()
        .position(|m| m.starts_with(&abbrev))
        .map(|i| i as u32)
}

fn long_month_index(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS.iter().position(|m| *m == name).map(|i| i as u32)
}

/// `YYYY-MM` bucket used by the grade trend series.
pub fn year_month(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}
