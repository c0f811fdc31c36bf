//! Conversation engine
//!
//! The orchestrator: combines classifier, extractor and (optionally) the
//! generative assist into per-turn state transitions over the session
//! store. The one rule everything else bends around: a task is only ever
//! created after an explicit, validated confirmation of a previously
//! stated proposal.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

mod slots;

pub use slots::{MIN_DURATION_MINS, SlotPolicy};

use crate::assist::{AssistAction, AssistAdapter};
use crate::classify::{PendingKind, Utterance, classify};
use crate::domain::{PendingProposal, PlanDraft, ProposalPayload, TaskDraft};
use crate::extract;
use crate::llm::Message;
use crate::materialize::Materializer;
use crate::session::SessionStore;
use calstore::{Priority, TaskStore};

/// Outcome of handling one inbound message
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub success: bool,
    pub message: String,
    pub requires_confirmation: bool,
}

impl Reply {
    fn say(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            requires_confirmation: false,
        }
    }

    fn ask(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            requires_confirmation: true,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            requires_confirmation: false,
        }
    }
}

/// The conversational scheduling engine
///
/// One instance serves all users; per-user state lives in the injected
/// session store. Handling is synchronous end-to-end per message - the
/// only await that can block on I/O is the assist call, and that is
/// bounded by the adapter's timeout.
pub struct ChatEngine {
    sessions: Arc<dyn SessionStore>,
    assist: Option<AssistAdapter>,
    materializer: Materializer,
    policy: SlotPolicy,
}

impl ChatEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        store: Arc<dyn TaskStore>,
        assist: Option<AssistAdapter>,
        policy: SlotPolicy,
    ) -> Self {
        Self {
            sessions,
            assist,
            materializer: Materializer::new(store),
            policy,
        }
    }

    /// Handle one message using the host's local clock
    pub async fn handle(&self, user_id: &str, text: &str) -> Reply {
        self.handle_at(user_id, text, chrono::Local::now().naive_local()).await
    }

    /// Handle one message against a fixed reference time
    pub async fn handle_at(&self, user_id: &str, text: &str, now: NaiveDateTime) -> Reply {
        let text = text.trim();
        if text.is_empty() {
            return Reply::say("Tell me what you'd like to schedule.");
        }

        let history = self.sessions.history(user_id);
        self.sessions.record_turn(user_id, Message::user(text));

        let pending = self.sessions.proposal(user_id);
        let kind = match pending.as_ref().map(|p| &p.payload) {
            Some(ProposalPayload::Task(_)) => PendingKind::Task,
            Some(ProposalPayload::Plan(_)) => PendingKind::Plan,
            None => PendingKind::None,
        };

        let utterance = classify(text, kind);
        info!(%user_id, ?utterance, ?kind, "handle: classified");

        let reply = match (pending, utterance) {
            (Some(proposal), Utterance::Confirmation) => self.confirm(user_id, proposal).await,
            (Some(_), Utterance::Rejection) => {
                self.sessions.clear_proposal(user_id);
                Reply::say("No problem, I've dropped it. What else would you like to schedule?")
            }
            (Some(proposal), Utterance::Greeting) => greet_with_context(&proposal),
            (Some(proposal), Utterance::Adjustment) => {
                if let ProposalPayload::Task(draft) = &proposal.payload {
                    self.adjust(user_id, draft, text, now, &history).await
                } else {
                    // Classifier never emits Adjustment for plans
                    self.supersede(user_id, text, now, &history).await
                }
            }
            (Some(_), _) => self.supersede(user_id, text, now, &history).await,
            (None, _) => self.idle_turn(user_id, text, now, &history).await,
        };

        self.sessions.record_turn(user_id, Message::assistant(&reply.message));
        reply
    }

    /// Unrelated message while a proposal is pending: drop it and handle
    /// the turn as if none existed
    async fn supersede(&self, user_id: &str, text: &str, now: NaiveDateTime, history: &[Message]) -> Reply {
        debug!(%user_id, "supersede: dropping pending proposal");
        self.sessions.clear_proposal(user_id);
        self.idle_turn(user_id, text, now, history).await
    }

    /// Transitions from the Idle state
    async fn idle_turn(&self, user_id: &str, text: &str, now: NaiveDateTime, history: &[Message]) -> Reply {
        match classify(text, PendingKind::None) {
            Utterance::Greeting => Reply::say("Hi! Tell me what you'd like to schedule and when."),
            Utterance::BareCreate => Reply::say("Sure - what's the task about, and when should it happen?"),
            Utterance::PlanRequest => self.propose_plan(user_id, text, now, history).await,
            Utterance::TopicOnly => self.propose_default_slot(user_id, text, now),
            _ => self.pipeline(user_id, text, now, history).await,
        }
    }

    /// Topic with no schedule: propose the default slot
    fn propose_default_slot(&self, user_id: &str, text: &str, now: NaiveDateTime) -> Reply {
        let title = extract::strip_schedule_tokens(text);
        let (start, end) = self.policy.default_slot(now);
        let draft = TaskDraft::from_window(title, start, end, Priority::Medium);

        let reply = Reply::ask(format!(
            "I can schedule \"{}\" for {} ({} priority). Shall I go ahead?",
            draft.title,
            describe_window(&draft),
            draft.priority
        ));
        self.sessions.set_proposal(user_id, PendingProposal::task(draft));
        reply
    }

    /// Full pipeline: assist when available, deterministic otherwise
    async fn pipeline(&self, user_id: &str, text: &str, now: NaiveDateTime, history: &[Message]) -> Reply {
        if let Some(assist) = &self.assist {
            let assist_reply = assist.respond(text, history, now).await;
            return match assist_reply.action {
                AssistAction::ProposeTask(draft) => {
                    debug!(%user_id, %draft.title, "pipeline: assist proposed a task");
                    let reply = Reply::ask(assist_reply.assistant_message);
                    self.sessions.set_proposal(user_id, PendingProposal::task(draft));
                    reply
                }
                AssistAction::ProposePlan(plan) => {
                    debug!(%user_id, %plan.title, task_count = plan.tasks.len(), "pipeline: assist proposed a plan");
                    let reply = Reply::ask(assist_reply.assistant_message);
                    self.sessions.set_proposal(user_id, PendingProposal::plan(plan));
                    reply
                }
                AssistAction::Clarify | AssistAction::None => Reply::say(assist_reply.assistant_message),
            };
        }

        self.deterministic_pipeline(user_id, text, now)
    }

    /// Deterministic fallback when no assist is wired
    fn deterministic_pipeline(&self, user_id: &str, text: &str, now: NaiveDateTime) -> Reply {
        let extracted = extract::extract(text, now);
        if extracted.is_empty() {
            return Reply::say("What would you like to schedule, and when?");
        }

        let title = extract::strip_schedule_tokens(text);
        let (start, end) = self.policy.window_from_extracted(&extracted, now);
        let draft = TaskDraft::from_window(title, start, end, Priority::Medium);

        let reply = Reply::ask(format!(
            "I can schedule \"{}\" for {} ({} priority). Shall I go ahead?",
            draft.title,
            describe_window(&draft),
            draft.priority
        ));
        self.sessions.set_proposal(user_id, PendingProposal::task(draft));
        reply
    }

    /// Plan/learning request: multi-task proposal
    async fn propose_plan(&self, user_id: &str, text: &str, now: NaiveDateTime, history: &[Message]) -> Reply {
        let topic = extract::strip_schedule_tokens(text);

        let plan = match &self.assist {
            Some(assist) => match assist.extract_signals(text, history).await {
                Ok(extraction) => {
                    if extraction.requires_clarification {
                        return Reply::say("Could you give me a bit more detail about what you'd like to plan?");
                    }
                    let tasks = extraction
                        .tasks
                        .iter()
                        .map(|signals| {
                            let (start, end) = self.policy.window_from_signals(signals, now);
                            TaskDraft::from_window(&signals.task_title, start, end, signals.priority)
                        })
                        .collect();
                    PlanDraft { title: topic, tasks }
                }
                Err(e) => {
                    warn!(%user_id, error = %e, "propose_plan: assist failed, using template week");
                    PlanDraft {
                        title: topic.clone(),
                        tasks: self.policy.template_week(&topic, now),
                    }
                }
            },
            None => PlanDraft {
                title: topic.clone(),
                tasks: self.policy.template_week(&topic, now),
            },
        };

        let reply = Reply::ask(describe_plan(&plan));
        self.sessions.set_proposal(user_id, PendingProposal::plan(plan));
        reply
    }

    /// Date/time adjustment against the pending task proposal
    async fn adjust(
        &self,
        user_id: &str,
        draft: &TaskDraft,
        text: &str,
        now: NaiveDateTime,
        history: &[Message],
    ) -> Reply {
        match self.policy.merge_adjustment(draft, text, now) {
            Some(updated) => {
                let reply = Reply::ask(format!(
                    "Updated: \"{}\" for {}. Shall I go ahead?",
                    updated.title,
                    describe_window(&updated)
                ));
                self.sessions.set_proposal(user_id, PendingProposal::task(updated));
                reply
            }
            None => {
                // Window went stale; start over from this message
                warn!(%user_id, "adjust: pending draft no longer parseable, dropping it");
                self.sessions.clear_proposal(user_id);
                self.pipeline(user_id, text, now, history).await
            }
        }
    }

    /// Confirmation: validate, materialize, clear
    async fn confirm(&self, user_id: &str, proposal: PendingProposal) -> Reply {
        let drafts = match proposal.payload {
            ProposalPayload::Task(draft) => vec![draft],
            ProposalPayload::Plan(plan) => plan.tasks,
        };

        let valid: Vec<TaskDraft> = drafts.into_iter().filter(TaskDraft::is_valid).collect();
        if valid.is_empty() {
            warn!(%user_id, "confirm: no valid drafts left in proposal");
            self.sessions.clear_proposal(user_id);
            return Reply::say("Those details went stale on me. Could you restate what you'd like to schedule?");
        }

        let report = self.materializer.materialize(&valid).await;
        self.sessions.clear_proposal(user_id);

        let titles: Vec<String> = valid.iter().map(|d| d.title.clone()).collect();
        let message = report.summary_message(&titles);
        if report.failed.is_empty() {
            info!(%user_id, created = report.created.len(), "confirm: materialized");
            Reply::say(message)
        } else {
            warn!(%user_id, failed = report.failed.len(), "confirm: materialization failures");
            Reply::fail(message)
        }
    }
}

/// Greeting while something is pending: restate, never lose context
fn greet_with_context(proposal: &PendingProposal) -> Reply {
    match &proposal.payload {
        ProposalPayload::Task(draft) => Reply::ask(format!(
            "Hi! I still have \"{}\" for {} waiting for your go-ahead. Should I schedule it?",
            draft.title,
            describe_window(draft)
        )),
        ProposalPayload::Plan(plan) => Reply::ask(format!(
            "Hi! The plan \"{}\" with {} sessions is still waiting. Should I schedule it?",
            plan.title,
            plan.tasks.len()
        )),
    }
}

/// Human-readable window, falling back to the raw fields when unparseable
fn describe_window(draft: &TaskDraft) -> String {
    match draft.parse_window() {
        Some((start, end)) => format!(
            "{} from {} to {}",
            start.format("%A %Y-%m-%d"),
            start.format("%H:%M"),
            end.format("%H:%M")
        ),
        None => format!("{} to {}", draft.start, draft.end),
    }
}

/// Multi-line plan summary with per-session windows
fn describe_plan(plan: &PlanDraft) -> String {
    let mut message = format!("Here's \"{}\":\n", plan.title);
    for task in &plan.tasks {
        message.push_str(&format!("- {}: {}\n", task.title, describe_window(task)));
    }
    message.push_str(&format!(
        "Shall I schedule {}?",
        match plan.tasks.len() {
            1 => "it".to_string(),
            n => format!("these {} sessions", n),
        }
    ));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft() -> TaskDraft {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        TaskDraft::from_window(
            "Gym",
            day.and_hms_opt(7, 0, 0).unwrap(),
            day.and_hms_opt(8, 0, 0).unwrap(),
            Priority::Medium,
        )
    }

    #[test]
    fn test_describe_window() {
        assert_eq!(describe_window(&draft()), "Thursday 2025-01-02 from 07:00 to 08:00");
    }

    #[test]
    fn test_describe_window_falls_back_to_raw_fields() {
        let stale = TaskDraft {
            title: "Gym".to_string(),
            start: "whenever".to_string(),
            end: "later".to_string(),
            priority: Priority::Medium,
        };
        assert_eq!(describe_window(&stale), "whenever to later");
    }

    #[test]
    fn test_greeting_restates_task_title() {
        let reply = greet_with_context(&PendingProposal::task(draft()));
        assert!(reply.message.contains("\"Gym\""));
        assert!(reply.requires_confirmation);
    }

    #[test]
    fn test_greeting_restates_plan() {
        let plan = PlanDraft {
            title: "Chest week".to_string(),
            tasks: vec![draft(), draft()],
        };
        let reply = greet_with_context(&PendingProposal::plan(plan));
        assert!(reply.message.contains("\"Chest week\""));
        assert!(reply.message.contains("2 sessions"));
    }

    #[test]
    fn test_reply_serializes_to_wire_shape() {
        let reply = Reply {
            success: true,
            message: "ok".to_string(),
            requires_confirmation: true,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["requiresConfirmation"], true);
    }
}
