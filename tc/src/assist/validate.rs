//! Assist output validation
//!
//! Model output is untrusted text. Extraction locates the first `{` and
//! the last `}`, parses the substring, and checks the declared shape
//! field by field. Anything off-contract is a validation failure - the
//! engine never sees a half-valid action.

use serde_json::Value;
use tracing::debug;

use super::{AssistAction, AssistError, AssistReply};
use crate::domain::{PlanDraft, SchedulingExtraction, TaskDraft};
use calstore::Priority;

/// Locate and parse the single JSON object in raw model output
pub fn extract_json(raw: &str) -> Result<Value, AssistError> {
    let start = raw.find('{').ok_or_else(|| AssistError::Malformed("no JSON object found".to_string()))?;
    let end = raw.rfind('}').ok_or_else(|| AssistError::Malformed("no closing brace".to_string()))?;
    if end < start {
        return Err(AssistError::Malformed("braces out of order".to_string()));
    }

    let value: Value = serde_json::from_str(&raw[start..=end])
        .map_err(|e| AssistError::Malformed(format!("JSON parse failed: {}", e)))?;

    if !value.is_object() {
        return Err(AssistError::Malformed("root is not an object".to_string()));
    }
    Ok(value)
}

/// Parse a conversational reply: `{assistant_message, action}`
pub fn parse_reply(raw: &str) -> Result<AssistReply, AssistError> {
    let value = extract_json(raw)?;

    let assistant_message = value
        .get("assistant_message")
        .and_then(Value::as_str)
        .ok_or_else(|| AssistError::Malformed("missing assistant_message".to_string()))?
        .to_string();

    let action = value
        .get("action")
        .ok_or_else(|| AssistError::Malformed("missing action".to_string()))?;
    let action_type = action
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AssistError::Malformed("action has no type".to_string()))?;

    let action = match action_type {
        "propose_task" => AssistAction::ProposeTask(task_payload(action)?),
        // Older prompt revisions declared "create_task"; it is accepted
        // but always treated as a proposal, never a direct create
        "create_task" => {
            debug!("parse_reply: legacy create_task action mapped to proposal");
            AssistAction::ProposeTask(task_payload(action)?)
        }
        "propose_plan" => AssistAction::ProposePlan(plan_payload(action)?),
        "clarify" => AssistAction::Clarify,
        "none" => AssistAction::None,
        other => {
            return Err(AssistError::Malformed(format!("unknown action type: {}", other)));
        }
    };

    Ok(AssistReply {
        assistant_message,
        action,
    })
}

/// Parse the legacy structured contract into a SchedulingExtraction
pub fn parse_signals(raw: &str) -> Result<SchedulingExtraction, AssistError> {
    let value = extract_json(raw)?;

    let extraction: SchedulingExtraction =
        serde_json::from_value(value).map_err(|e| AssistError::Malformed(format!("bad extraction shape: {}", e)))?;

    if extraction.tasks.is_empty() {
        return Err(AssistError::Malformed("tasks array is empty".to_string()));
    }
    for task in &extraction.tasks {
        if task.task_title.trim().is_empty() {
            return Err(AssistError::Malformed("task has empty taskTitle".to_string()));
        }
    }
    Ok(extraction)
}

/// Required payload for task-like actions: title + start + end + priority
fn task_payload(action: &Value) -> Result<TaskDraft, AssistError> {
    let title = required_str(action, "title")?;
    if title.trim().is_empty() {
        return Err(AssistError::Malformed("task title is empty".to_string()));
    }
    Ok(TaskDraft {
        title,
        start: required_str(action, "start")?,
        end: required_str(action, "end")?,
        priority: required_priority(action)?,
    })
}

/// Required payload for plans: planTitle + non-empty task list
fn plan_payload(action: &Value) -> Result<PlanDraft, AssistError> {
    let title = required_str(action, "planTitle")?;
    if title.trim().is_empty() {
        return Err(AssistError::Malformed("planTitle is empty".to_string()));
    }

    let tasks = action
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or_else(|| AssistError::Malformed("plan has no tasks array".to_string()))?;
    if tasks.is_empty() {
        return Err(AssistError::Malformed("plan tasks array is empty".to_string()));
    }

    let tasks = tasks.iter().map(task_payload).collect::<Result<Vec<_>, _>>()?;
    Ok(PlanDraft { title, tasks })
}

fn required_str(value: &Value, field: &str) -> Result<String, AssistError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| AssistError::Malformed(format!("missing field: {}", field)))
}

fn required_priority(value: &Value) -> Result<Priority, AssistError> {
    required_str(value, "priority")?.parse().map_err(AssistError::Malformed)
}
