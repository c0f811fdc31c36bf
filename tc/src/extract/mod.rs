//! Deterministic date/time extraction
//!
//! Parses weekday names, relative terms, absolute numeric dates and clock
//! times out of raw text. Never guesses: a field that cannot be resolved
//! stays `None`, and a time is never fabricated when only a date was given
//! (or vice versa). All date arithmetic in the whole engine happens here
//! and in the slot resolver - the generative assist is only ever allowed
//! to name the tokens.

use chrono::NaiveDateTime;

mod date;
mod time;

pub use date::{ParsedDate, has_date_token, parse_date};
pub use time::{has_time_token, parse_time};

/// Structured output of deterministic extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extracted {
    /// Resolved calendar day, if any date expression was found
    pub date: Option<chrono::NaiveDate>,

    /// Resolved clock time, if any time expression was found
    pub time: Option<chrono::NaiveTime>,

    /// The text literally said "today"
    pub explicit_today: bool,
}

impl Extracted {
    /// Neither field resolved
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.time.is_none()
    }
}

/// Extract date and time signals from raw text
///
/// `reference_now` anchors relative expressions; weekday names resolve to
/// the next occurrence on or after its calendar day.
pub fn extract(text: &str, reference_now: NaiveDateTime) -> Extracted {
    let parsed_date = parse_date(text, reference_now.date());
    Extracted {
        date: parsed_date.map(|p| p.date),
        time: parse_time(text),
        explicit_today: parsed_date.is_some_and(|p| p.explicit_today),
    }
}

/// True when the text contains any recognizable date or time token, even
/// one that does not fully resolve
pub fn has_schedule_token(text: &str) -> bool {
    has_date_token(text) || has_time_token(text)
}

fn scrub_res() -> &'static Vec<regex::Regex> {
    use std::sync::OnceLock;
    static RES: OnceLock<Vec<regex::Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            time::CLOCK_PATTERN,
            time::MERIDIEM_PATTERN,
            time::BARE_HOUR_PATTERN,
            date::RELATIVE_PATTERN,
            date::WEEKDAY_PATTERN,
            date::ISO_PATTERN,
            date::NUMERIC_PATTERN,
        ]
        .iter()
        .map(|pattern| regex::Regex::new(&format!(r"(?i)(?:\b(?:at|on)\s+)?(?:{})", pattern)).unwrap())
        .collect()
    })
}

/// Remove recognized date/time tokens from the text, leaving the topic
///
/// Used to derive a task title from messages like "gym tomorrow at 7am".
/// Returns the trimmed original text when scrubbing leaves nothing usable.
pub fn strip_schedule_tokens(text: &str) -> String {
    let mut scrubbed = text.to_string();
    for re in scrub_res() {
        scrubbed = re.replace_all(&scrubbed, " ").into_owned();
    }

    let cleaned = scrubbed.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = cleaned.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());

    let topic = if cleaned.len() >= 2 { cleaned } else { text.trim() };
    capitalize_first(topic)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
