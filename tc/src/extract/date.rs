//! Calendar date extraction
//!
//! Recognizes relative terms (today, tomorrow, next week), weekday names
//! and absolute numeric dates. Resolution is relative to a caller-supplied
//! reference date; weekdays always resolve on or after it.

use chrono::{Datelike, Months, NaiveDate, Weekday};
use regex::Regex;
use std::sync::OnceLock;

pub(crate) const WEEKDAY_PATTERN: &str = r"\b(?:(next)\s+)?(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sat|sunday|sun)\b";
pub(crate) const ISO_PATTERN: &str = r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b";
pub(crate) const NUMERIC_PATTERN: &str = r"\b(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{2,4}))?\b";
pub(crate) const RELATIVE_PATTERN: &str = r"\b(?:day after tomorrow|tomorrow|today|next week|next month)\b";

fn weekday_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(WEEKDAY_PATTERN).unwrap())
}

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ISO_PATTERN).unwrap())
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUMERIC_PATTERN).unwrap())
}

const RELATIVE_TERMS: &[&str] = &["day after tomorrow", "tomorrow", "today", "next week", "next month"];

/// Result of date extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    /// The text literally said "today"
    pub explicit_today: bool,
}

/// True when the text contains something shaped like a date, regardless of
/// whether it resolves to a valid calendar day
pub fn has_date_token(text: &str) -> bool {
    let text = text.to_lowercase();
    RELATIVE_TERMS.iter().any(|term| text.contains(term))
        || weekday_re().is_match(&text)
        || iso_re().is_match(&text)
        || numeric_re().is_match(&text)
}

/// Extract the first date expression from the text
///
/// Returns `None` when nothing date-shaped is present or the expression
/// does not resolve to a valid day. Never guesses.
pub fn parse_date(text: &str, reference: NaiveDate) -> Option<ParsedDate> {
    let text = text.to_lowercase();

    // Relative terms first; "day after tomorrow" must win over "tomorrow"
    if text.contains("day after tomorrow") {
        return plain(reference.succ_opt()?.succ_opt()?);
    }
    if text.contains("tomorrow") {
        return plain(reference.succ_opt()?);
    }
    if text.contains("today") {
        return Some(ParsedDate {
            date: reference,
            explicit_today: true,
        });
    }
    if text.contains("next week") {
        return plain(reference + chrono::Duration::days(7));
    }
    if text.contains("next month") {
        return plain(reference.checked_add_months(Months::new(1))?);
    }

    if let Some(caps) = weekday_re().captures(&text) {
        let target = weekday_from_name(&caps[2])?;
        let mut days_ahead = (target.num_days_from_monday() as i64
            - reference.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        if caps.get(1).is_some() {
            days_ahead += 7;
        }
        return plain(reference + chrono::Duration::days(days_ahead));
    }

    if let Some(caps) = iso_re().captures(&text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return plain(NaiveDate::from_ymd_opt(year, month, day)?);
    }

    if let Some(caps) = numeric_re().captures(&text) {
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok());

        // Day-first convention; when only the second component can be a
        // day, read it month-first instead
        let (day, month) = if b > 12 && a <= 12 { (b, a) } else { (a, b) };
        if !(1..=12).contains(&month) {
            return None;
        }

        let date = match year {
            Some(y) => {
                let y = if y < 100 { y + 2000 } else { y };
                NaiveDate::from_ymd_opt(y, month, day)?
            }
            None => {
                // Year-less dates mean the next upcoming occurrence
                let this_year = NaiveDate::from_ymd_opt(reference.year(), month, day)?;
                if this_year < reference {
                    NaiveDate::from_ymd_opt(reference.year() + 1, month, day)?
                } else {
                    this_year
                }
            }
        };
        return plain(date);
    }

    None
}

fn plain(date: NaiveDate) -> Option<ParsedDate> {
    Some(ParsedDate {
        date,
        explicit_today: false,
    })
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tues" | "tue" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thurs" | "thur" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}
