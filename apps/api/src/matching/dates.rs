//! Month/year parsing for resume date ranges.

use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const PRESENT_WORDS: &[&str] = &[
    "present", "current", "currently", "ongoing", "now", "today", "till date", "to date",
];

/// One end of a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Month(NaiveDate),
    Present,
}

/// Parses "Jan 2020", "January 2020", "Sept. 2020", "01/2020", "2020-01",
/// "2020" or a present-marker. Returns `None` for anything else.
pub fn parse_date_bound(raw: &str) -> Option<DateBound> {
    let cleaned = raw
        .trim()
        .to_lowercase()
        .replace(['.', ','], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        return None;
    }
    if PRESENT_WORDS.contains(&cleaned.as_str()) {
        return Some(DateBound::Present);
    }
    parse_month_year(&cleaned).map(DateBound::Month)
}

fn parse_month_year(s: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let (month, year) = match tokens.as_slice() {
        [name, year] if name.chars().all(|c| c.is_ascii_alphabetic()) => {
            (month_from_name(name)?, parse_year(year)?)
        }
        [single] => parse_numeric(single)?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Accepts any prefix of a month name of at least three letters ("sep", "sept").
fn month_from_name(name: &str) -> Option<u32> {
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|full| full.starts_with(name))
        .map(|idx| idx as u32 + 1)
}

fn parse_year(raw: &str) -> Option<i32> {
    if raw.len() != 4 {
        return None;
    }
    raw.parse::<i32>().ok().filter(|y| (1900..=2200).contains(y))
}

fn parse_numeric(raw: &str) -> Option<(u32, i32)> {
    if let Some((a, b)) = raw.split_once(['/', '-']) {
        let (month, year) = if a.len() == 4 { (b, a) } else { (a, b) };
        let month = month.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
        return Some((month, parse_year(year)?));
    }
    Some((1, parse_year(raw)?))
}

/// Splits "Jan 2020 - Present" / "2019 to 2021" into its two ends.
pub fn split_date_range(raw: &str) -> Option<(String, String)> {
    for sep in [" - ", " – ", " — ", " to ", "–", "—"] {
        if let Some((start, end)) = raw.split_once(sep) {
            return Some((start.trim().to_string(), end.trim().to_string()));
        }
    }
    // "01/2020-03/2021" style without spaces
    let parts: Vec<&str> = raw.split('-').map(str::trim).collect();
    if parts.len() == 2 && parts.iter().all(|p| parse_date_bound(p).is_some()) {
        return Some((parts[0].to_string(), parts[1].to_string()));
    }
    None
}

/// Months elapsed between two bounds. An explicit end month counts in full;
/// an open-ended range runs up to (not including) the month of `today`.
/// Returns `None` when the range is inverted or starts with "present".
pub fn months_between(start: DateBound, end: DateBound, today: NaiveDate) -> Option<u32> {
    let DateBound::Month(start) = start else {
        return None;
    };
    let end_index = match end {
        DateBound::Month(end) => month_index(end) + 1,
        DateBound::Present => month_index(today),
    };
    u32::try_from(end_index - month_index(start)).ok()
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}
