//! Slot arithmetic: default windows, signal resolution, adjustments
//!
//! All date math the engine performs lives here. Inputs are either the
//! deterministic extractor's output or unresolved signals named by the
//! generative assist; outputs are concrete local windows.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use tracing::debug;

use crate::domain::{TaskDraft, TaskSignals};
use crate::extract::{self, Extracted};

/// Adjustments never shrink a task below this duration
pub const MIN_DURATION_MINS: i64 = 30;

/// Default-slot policy for requests that name no schedule
#[derive(Debug, Clone, Copy)]
pub struct SlotPolicy {
    /// Default presentation hour on weekdays
    pub weekday_hour: u32,
    /// Default presentation hour on weekends
    pub weekend_hour: u32,
    /// Default task duration in minutes
    pub duration_mins: i64,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            weekday_hour: 16,
            weekend_hour: 10,
            duration_mins: 60,
        }
    }
}

impl SlotPolicy {
    /// Default presentation time for a given day
    pub fn presentation_time(&self, day: NaiveDate) -> NaiveTime {
        let hour = match day.weekday() {
            Weekday::Sat | Weekday::Sun => self.weekend_hour,
            _ => self.weekday_hour,
        };
        NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default()
    }

    /// Default slot: today at the presentation time, or tomorrow once
    /// today's presentation time has passed
    pub fn default_slot(&self, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let today = now.date();
        let day = if now.time() < self.presentation_time(today) {
            today
        } else {
            today.succ_opt().unwrap_or(today)
        };
        let start = day.and_time(self.presentation_time(day));
        (start, start + Duration::minutes(self.duration_mins))
    }

    /// Build a concrete window from partial extraction output
    ///
    /// Missing fields fall back to the default slot; a window that would
    /// start in the past with no explicitly named day rolls to the next
    /// day, as does an explicit "today" whose time has already passed.
    pub fn window_from_extracted(&self, extracted: &Extracted, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let (start, end) = match (extracted.date, extracted.time) {
            (Some(date), Some(time)) => {
                let start = date.and_time(time);
                (start, start + Duration::minutes(self.duration_mins))
            }
            (Some(date), None) => {
                let start = date.and_time(self.presentation_time(date));
                (start, start + Duration::minutes(self.duration_mins))
            }
            (None, Some(time)) => {
                let start = now.date().and_time(time);
                (start, start + Duration::minutes(self.duration_mins))
            }
            (None, None) => self.default_slot(now),
        };

        // "today at 5pm" said in the evening means tomorrow; so does a
        // bare time that has already passed
        let day_was_implied = extracted.date.is_none();
        if start <= now && (extracted.explicit_today || day_was_implied) {
            debug!(%start, "window_from_extracted: rolling past window to next day");
            let start = start + Duration::days(1);
            let end = end + Duration::days(1);
            return (start, end);
        }

        (start, end)
    }

    /// Resolve one task's unresolved signals into a concrete window
    ///
    /// The signals name tokens (weekday, date expression, month, time);
    /// every resolution rule is the deterministic extractor's.
    pub fn window_from_signals(&self, signals: &TaskSignals, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let today = now.date();

        let parsed_date = signals
            .weekday
            .as_deref()
            .and_then(|name| extract::parse_date(name, today))
            .map(|parsed| {
                let offset_weeks = signals.weekday_ordinal.unwrap_or(1).saturating_sub(1) as i64;
                extract::ParsedDate {
                    date: parsed.date + Duration::days(7 * offset_weeks),
                    ..parsed
                }
            })
            .or_else(|| {
                signals
                    .date_expression
                    .as_deref()
                    .and_then(|expr| extract::parse_date(expr, today))
            })
            .or_else(|| first_of_month(signals.month, today));

        let extracted = Extracted {
            date: parsed_date.map(|p| p.date),
            time: signals.time.as_deref().and_then(extract::parse_time),
            explicit_today: parsed_date.is_some_and(|p| p.explicit_today),
        };

        self.window_from_extracted(&extracted, now)
    }

    /// Template fallback plan: three sessions on the next Monday,
    /// Wednesday and Friday strictly after today
    pub fn template_week(&self, topic: &str, now: NaiveDateTime) -> Vec<TaskDraft> {
        let tomorrow = now.date().succ_opt().unwrap_or(now.date());

        [Weekday::Mon, Weekday::Wed, Weekday::Fri]
            .iter()
            .enumerate()
            .map(|(index, weekday)| {
                let days_ahead = (weekday.num_days_from_monday() as i64
                    - tomorrow.weekday().num_days_from_monday() as i64)
                    .rem_euclid(7);
                let day = tomorrow + Duration::days(days_ahead);
                let start = day.and_time(self.presentation_time(day));
                TaskDraft::from_window(
                    format!("{} - session {}", topic, index + 1),
                    start,
                    start + Duration::minutes(self.duration_mins),
                    calstore::Priority::Medium,
                )
            })
            .collect()
    }

    /// Merge a recognized date/time adjustment into an existing draft
    ///
    /// Duration is preserved (minimum 30 minutes). Returns `None` when the
    /// existing window is no longer parseable; the caller treats the draft
    /// as stale. An adjustment whose tokens resolve to nothing leaves the
    /// draft unchanged.
    pub fn merge_adjustment(&self, draft: &TaskDraft, text: &str, now: NaiveDateTime) -> Option<TaskDraft> {
        let (start, end) = draft.parse_window()?;
        let duration = (end - start).max(Duration::minutes(MIN_DURATION_MINS));

        let extracted = extract::extract(text, now);
        if extracted.is_empty() {
            return Some(draft.clone());
        }

        let new_date = extracted.date.unwrap_or_else(|| start.date());
        let new_time = extracted.time.unwrap_or_else(|| start.time());
        let mut new_start = new_date.and_time(new_time);
        if extracted.explicit_today && new_start <= now {
            debug!(%new_start, "merge_adjustment: explicit today already passed, rolling to next day");
            new_start += Duration::days(1);
        }

        Some(TaskDraft::from_window(
            &draft.title,
            new_start,
            new_start + duration,
            draft.priority,
        ))
    }
}

fn first_of_month(month: Option<u32>, today: NaiveDate) -> Option<extract::ParsedDate> {
    let month = month?;
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, 1)?;
    let date = if this_year < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, 1)?
    } else {
        this_year
    };
    Some(extract::ParsedDate {
        date,
        explicit_today: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calstore::Priority;

    fn policy() -> SlotPolicy {
        SlotPolicy::default()
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_default_slot_weekday_afternoon() {
        // Wednesday morning: slot is today 16:00
        let now = datetime(2025, 1, 1, 9, 0);
        let (start, end) = policy().default_slot(now);
        assert_eq!(start, datetime(2025, 1, 1, 16, 0));
        assert_eq!(end, datetime(2025, 1, 1, 17, 0));
    }

    #[test]
    fn test_default_slot_rolls_to_tomorrow() {
        // Wednesday evening: 16:00 has passed, slot is Thursday
        let now = datetime(2025, 1, 1, 20, 0);
        let (start, _) = policy().default_slot(now);
        assert_eq!(start, datetime(2025, 1, 2, 16, 0));
    }

    #[test]
    fn test_default_slot_weekend_hour() {
        // Saturday morning before 10:00
        let now = datetime(2025, 1, 4, 8, 0);
        let (start, _) = policy().default_slot(now);
        assert_eq!(start, datetime(2025, 1, 4, 10, 0));
    }

    #[test]
    fn test_window_today_rollover() {
        // "today at 5pm" said at 20:00 resolves to tomorrow 17:00
        let now = datetime(2025, 1, 1, 20, 0);
        let extracted = extract::extract("today at 5pm", now);
        let (start, end) = policy().window_from_extracted(&extracted, now);
        assert_eq!(start, datetime(2025, 1, 2, 17, 0));
        assert_eq!(end, datetime(2025, 1, 2, 18, 0));
    }

    #[test]
    fn test_window_bare_time_in_past_rolls() {
        let now = datetime(2025, 1, 1, 12, 0);
        let extracted = extract::extract("at 7am", now);
        let (start, _) = policy().window_from_extracted(&extracted, now);
        assert_eq!(start, datetime(2025, 1, 2, 7, 0));
    }

    #[test]
    fn test_window_named_day_not_rolled() {
        // An explicitly named future day keeps its time even if early
        let now = datetime(2025, 1, 1, 12, 0);
        let extracted = extract::extract("tomorrow at 7am", now);
        let (start, _) = policy().window_from_extracted(&extracted, now);
        assert_eq!(start, datetime(2025, 1, 2, 7, 0));
    }

    #[test]
    fn test_window_date_only_uses_presentation_time() {
        let now = datetime(2025, 1, 1, 9, 0);
        let extracted = extract::extract("on friday", now);
        let (start, _) = policy().window_from_extracted(&extracted, now);
        // Friday 2025-01-03 is a weekday
        assert_eq!(start, datetime(2025, 1, 3, 16, 0));
    }

    #[test]
    fn test_window_from_signals_weekday_ordinal() {
        let now = datetime(2025, 1, 1, 9, 0);
        let signals = TaskSignals {
            task_title: "Chest day".to_string(),
            date_expression: None,
            month: None,
            weekday: Some("monday".to_string()),
            weekday_ordinal: Some(2),
            time: Some("6pm".to_string()),
            priority: Priority::Medium,
        };
        let (start, _) = policy().window_from_signals(&signals, now);
        // Next Monday is Jan 6; second occurrence is Jan 13
        assert_eq!(start, datetime(2025, 1, 13, 18, 0));
    }

    #[test]
    fn test_window_from_signals_month_only() {
        let now = datetime(2025, 6, 15, 9, 0);
        let signals = TaskSignals {
            task_title: "Taxes".to_string(),
            date_expression: None,
            month: Some(3),
            weekday: None,
            weekday_ordinal: None,
            time: None,
            priority: Priority::Medium,
        };
        let (start, _) = policy().window_from_signals(&signals, now);
        // March has passed: next year, weekday presentation time applies
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_template_week_lands_on_mon_wed_fri() {
        let now = datetime(2025, 1, 1, 9, 0);
        let drafts = policy().template_week("Chest work", now);
        assert_eq!(drafts.len(), 3);

        let days: Vec<Weekday> = drafts
            .iter()
            .map(|d| d.parse_window().unwrap().0.date().weekday())
            .collect();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);

        // All strictly after "today" (Wednesday): Wednesday session is next week
        let wednesday = drafts[1].parse_window().unwrap().0.date();
        assert_eq!(wednesday, NaiveDate::from_ymd_opt(2025, 1, 8).unwrap());
    }

    #[test]
    fn test_merge_adjustment_preserves_time_and_duration() {
        let now = datetime(2025, 1, 1, 9, 0);
        let draft = TaskDraft::from_window("Gym", datetime(2025, 1, 1, 16, 0), datetime(2025, 1, 1, 17, 0), Priority::Medium);

        let merged = policy().merge_adjustment(&draft, "tuesday", now).unwrap();
        let (start, end) = merged.parse_window().unwrap();
        assert_eq!(start, datetime(2025, 1, 7, 16, 0));
        assert_eq!(end, datetime(2025, 1, 7, 17, 0));
        assert_eq!(merged.title, "Gym");
    }

    #[test]
    fn test_merge_adjustment_time_only_keeps_date() {
        let now = datetime(2025, 1, 1, 9, 0);
        let draft = TaskDraft::from_window("Gym", datetime(2025, 1, 7, 16, 0), datetime(2025, 1, 7, 17, 30), Priority::Medium);

        let merged = policy().merge_adjustment(&draft, "at 6pm", now).unwrap();
        let (start, end) = merged.parse_window().unwrap();
        assert_eq!(start, datetime(2025, 1, 7, 18, 0));
        // 90-minute duration preserved
        assert_eq!(end, datetime(2025, 1, 7, 19, 30));
    }

    #[test]
    fn test_merge_adjustment_today_rollover() {
        let now = datetime(2025, 1, 1, 20, 0);
        let draft = TaskDraft::from_window("Gym", datetime(2025, 1, 2, 16, 0), datetime(2025, 1, 2, 17, 0), Priority::Medium);

        let merged = policy().merge_adjustment(&draft, "today at 5pm", now).unwrap();
        let (start, _) = merged.parse_window().unwrap();
        assert_eq!(start, datetime(2025, 1, 2, 17, 0));
    }

    #[test]
    fn test_merge_adjustment_enforces_minimum_duration() {
        let now = datetime(2025, 1, 1, 9, 0);
        let mut draft = TaskDraft::from_window("Gym", datetime(2025, 1, 2, 16, 0), datetime(2025, 1, 2, 17, 0), Priority::Medium);
        draft.end = "2025-01-02 16:10".to_string();

        let merged = policy().merge_adjustment(&draft, "friday", now).unwrap();
        let (start, end) = merged.parse_window().unwrap();
        assert_eq!(end - start, Duration::minutes(30));
    }

    #[test]
    fn test_merge_adjustment_stale_window() {
        let now = datetime(2025, 1, 1, 9, 0);
        let draft = TaskDraft {
            title: "Gym".to_string(),
            start: "whenever".to_string(),
            end: "later".to_string(),
            priority: Priority::Medium,
        };
        assert!(policy().merge_adjustment(&draft, "tuesday", now).is_none());
    }

    #[test]
    fn test_merge_adjustment_unresolvable_token_is_noop() {
        let now = datetime(2025, 1, 1, 9, 0);
        let draft = TaskDraft::from_window("Gym", datetime(2025, 1, 2, 16, 0), datetime(2025, 1, 2, 17, 0), Priority::Medium);

        let merged = policy().merge_adjustment(&draft, "5:99", now).unwrap();
        assert_eq!(merged, draft);
    }
}
