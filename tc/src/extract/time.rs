//! Clock time extraction
//!
//! Recognizes `H:MM[am|pm]`, `H[am|pm]` and `at H` (24-hour). Invalid
//! ranges fail extraction for the time field rather than guessing.

use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;

pub(crate) const CLOCK_PATTERN: &str = r"\b(\d{1,2}):(\d{2})\s*(am|pm)?\b";
pub(crate) const MERIDIEM_PATTERN: &str = r"\b(\d{1,2})\s*(am|pm)\b";
// "at 17" style; digits followed by a date separator are left to the
// date parser
pub(crate) const BARE_HOUR_PATTERN: &str = r"\bat\s+(\d{1,2})\b(?:[^:/.\-0-9]|$)";

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CLOCK_PATTERN).unwrap())
}

fn meridiem_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MERIDIEM_PATTERN).unwrap())
}

fn bare_hour_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BARE_HOUR_PATTERN).unwrap())
}

/// True when the text contains something shaped like a clock time,
/// regardless of whether the value is in range
pub fn has_time_token(text: &str) -> bool {
    let text = text.to_lowercase();
    clock_re().is_match(&text) || meridiem_re().is_match(&text) || bare_hour_re().is_match(&text)
}

/// Extract the first clock time from the text
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.to_lowercase();

    if let Some(caps) = clock_re().captures(&text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let hour = match caps.get(3).map(|m| m.as_str()) {
            Some(meridiem) => to_24_hour(hour, meridiem)?,
            None if hour <= 23 => hour,
            None => return None,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }

    if let Some(caps) = meridiem_re().captures(&text) {
        let hour: u32 = caps[1].parse().ok()?;
        let hour = to_24_hour(hour, &caps[2])?;
        return NaiveTime::from_hms_opt(hour, 0, 0);
    }

    if let Some(caps) = bare_hour_re().captures(&text) {
        let hour: u32 = caps[1].parse().ok()?;
        if hour <= 23 {
            return NaiveTime::from_hms_opt(hour, 0, 0);
        }
        return None;
    }

    None
}

/// Convert a 12-hour clock hour to 24-hour; hours outside 1-12 are invalid
fn to_24_hour(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    Some(match (hour, meridiem) {
        (12, "am") => 0,
        (12, "pm") => 12,
        (h, "am") => h,
        (h, _) => h + 12,
    })
}
