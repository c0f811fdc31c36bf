//! Proposal and extraction domain types

use calstore::Priority;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format used in draft payloads ("2025-01-02 16:00")
pub const DRAFT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A not-yet-created candidate task, pending user confirmation
///
/// `start`/`end` are carried in [`DRAFT_TIMESTAMP_FORMAT`] and re-parsed at
/// confirmation time. Drafts built by the engine always contain valid
/// values; drafts built from generative-assist output may not, which is
/// what the confirmation-time validation exists to catch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskDraft {
    /// Build a draft from a concrete window
    pub fn from_window(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime, priority: Priority) -> Self {
        Self {
            title: title.into(),
            start: start.format(DRAFT_TIMESTAMP_FORMAT).to_string(),
            end: end.format(DRAFT_TIMESTAMP_FORMAT).to_string(),
            priority,
        }
    }

    /// Parse the draft window back into timestamps
    ///
    /// Returns `None` when either field is unparseable or the window is
    /// not strictly increasing - the draft is then invalid for creation.
    pub fn parse_window(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = NaiveDateTime::parse_from_str(&self.start, DRAFT_TIMESTAMP_FORMAT).ok()?;
        let end = NaiveDateTime::parse_from_str(&self.end, DRAFT_TIMESTAMP_FORMAT).ok()?;
        if end <= start {
            return None;
        }
        Some((start, end))
    }

    /// A draft is creatable when it has a title and a valid window
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && self.parse_window().is_some()
    }
}

/// A multi-task plan pending confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub title: String,
    pub tasks: Vec<TaskDraft>,
}

/// Payload of a pending proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalPayload {
    Task(TaskDraft),
    Plan(PlanDraft),
}

/// The single per-user proposal slot
///
/// At most one exists per user at any time; it is replaced, never merged,
/// except by the date/time-adjustment transition.
#[derive(Debug, Clone)]
pub struct PendingProposal {
    pub payload: ProposalPayload,
    pub created_at: i64,
}

impl PendingProposal {
    pub fn task(draft: TaskDraft) -> Self {
        Self {
            payload: ProposalPayload::Task(draft),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn plan(draft: PlanDraft) -> Self {
        Self {
            payload: ProposalPayload::Plan(draft),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Scheduling intent declared by an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateTask,
    ScheduleOnly,
    Reschedule,
    MultiSchedule,
}

/// Unresolved scheduling signals for one task
///
/// All fields are as-named by the source (deterministic parser or model);
/// no date arithmetic has been applied yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSignals {
    pub task_title: String,

    /// Free-form date words ("tomorrow", "next week", "12/05")
    #[serde(default)]
    pub date_expression: Option<String>,

    /// Month number 1-12
    #[serde(default)]
    pub month: Option<u32>,

    /// Weekday name ("tuesday")
    #[serde(default)]
    pub weekday: Option<String>,

    /// Which occurrence of the weekday within the plan (1-based)
    #[serde(default)]
    pub weekday_ordinal: Option<u32>,

    /// Clock time words ("7am", "17:30")
    #[serde(default)]
    pub time: Option<String>,

    pub priority: Priority,
}

/// Normalized scheduling extraction, shape-identical whether it came from
/// the deterministic extractor or the generative assist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingExtraction {
    pub intent: Intent,
    pub tasks: Vec<TaskSignals>,
    #[serde(default)]
    pub requires_time_confirmation: bool,
    #[serde(default)]
    pub requires_clarification: bool,
}
