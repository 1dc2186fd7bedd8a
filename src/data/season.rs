//! Season identification
//!
//! A season is named by the calendar year it starts in. Games from October
//! through December belong to the season starting that year; games from
//! January through September belong to the season that started the year
//! before.

use chrono::{Datelike, NaiveDate};

/// Where a table's season values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonSource {
    /// The explicit season column had at least one usable value
    Explicit,
    /// No usable season column; every value was inferred from its date
    Inferred,
}

/// Season start year for a game date
pub fn season_start_year(date: NaiveDate) -> i32 {
    if date.month() >= 10 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Infer seasons for a whole column of dates
pub fn infer_seasons(dates: &[Option<NaiveDate>]) -> Vec<Option<i32>> {
    dates.iter().map(|d| d.map(season_start_year)).collect()
}

/// Parse an explicit season cell into a start year
///
/// Accepts plain years (`2021`, `2021.0`), NBA season codes whose trailing
/// four digits are the year (`22021`), and ranges (`2021-22`). Anything that
/// does not yield a four-digit year is null.
pub fn parse_season(s: &str) -> Option<i32> {
    let s = s.trim();

    let year = if let Some(v) = super::cells::parse_int(s) {
        if (10_000..100_000).contains(&v) {
            v % 10_000
        } else {
            v
        }
    } else {
        let head: String = s.chars().take(4).collect();
        let rest = s.chars().nth(4);
        if head.len() == 4 && head.chars().all(|c| c.is_ascii_digit()) && rest == Some('-') {
            head.parse::<i64>().ok()?
        } else {
            return None;
        }
    };

    if (1000..=9999).contains(&year) {
        Some(year as i32)
    } else {
        None
    }
}

/// Decide a table's season column
///
/// All-or-nothing per column: when an explicit column exists and any cell
/// parses, explicit values are trusted as-is (unparseable cells stay null and
/// the row is later dropped). Only when the column is absent or entirely
/// unusable is every season inferred from its date.
pub fn resolve_seasons(
    explicit: Option<Vec<Option<i32>>>,
    dates: &[Option<NaiveDate>],
) -> (Vec<Option<i32>>, SeasonSource) {
    match explicit {
        Some(values) if values.iter().any(Option::is_some) => (values, SeasonSource::Explicit),
        _ => (infer_seasons(dates), SeasonSource::Inferred),
    }
}
