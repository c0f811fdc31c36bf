//! Integration tests for TaskChat
//!
//! These tests drive the whole engine end-to-end: classifier, extractor,
//! assist adapter (scripted), state machine and materializer against the
//! in-memory task store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use calstore::{MemoryStore, TaskStore};
use taskchat::assist::AssistAdapter;
use taskchat::engine::{ChatEngine, SlotPolicy};
use taskchat::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use taskchat::session::{MemorySessionStore, SessionStore};

// =============================================================================
// Test doubles
// =============================================================================

/// Scripted LLM: returns canned texts in order, repeating the last one
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
}

impl ScriptedLlm {
    fn new(texts: &[&str]) -> Self {
        Self {
            responses: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(text) => {
                *self.last.lock().unwrap() = Some(text.clone());
                Ok(CompletionResponse::text(text))
            }
            None => match self.last.lock().unwrap().clone() {
                Some(text) => Ok(CompletionResponse::text(text)),
                None => Err(LlmError::InvalidResponse("script empty".to_string())),
            },
        }
    }
}

/// LLM that never answers within any reasonable timeout
struct StalledLlm;

#[async_trait]
impl LlmClient for StalledLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(CompletionResponse::text("too late"))
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    engine: ChatEngine,
    sessions: Arc<MemorySessionStore>,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn deterministic() -> Self {
        Self::build(None)
    }

    fn with_assist(llm: Arc<dyn LlmClient>) -> Self {
        Self::build(Some(AssistAdapter::new(llm, Duration::from_secs(5), 1024)))
    }

    fn with_assist_timeout(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self::build(Some(AssistAdapter::new(llm, timeout, 1024)))
    }

    fn build(assist: Option<AssistAdapter>) -> Self {
        let sessions = Arc::new(MemorySessionStore::new());
        let store = Arc::new(MemoryStore::new());
        let engine = ChatEngine::new(sessions.clone(), store.clone(), assist, SlotPolicy::default());
        Self {
            engine,
            sessions,
            store,
        }
    }
}

/// Wednesday morning
fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

/// Wednesday evening, past the default presentation time
fn evening() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(20, 0, 0).unwrap()
}

fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_propose_then_confirm_creates_exactly_one_task() {
    let h = Harness::deterministic();

    let reply = h.engine.handle_at("amy", "gym tomorrow at 7am", morning()).await;
    assert!(reply.success);
    assert!(reply.requires_confirmation);
    assert!(reply.message.contains("\"Gym\""));
    assert!(h.store.is_empty(), "no task before confirmation");

    let reply = h.engine.handle_at("amy", "confirm", morning()).await;
    assert!(reply.success);
    assert!(!reply.requires_confirmation);

    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Gym");
    assert_eq!(tasks[0].start, datetime(2025, 1, 2, 7, 0));
    assert_eq!(tasks[0].end, datetime(2025, 1, 2, 8, 0));
    assert_eq!(tasks[0].priority, calstore::Priority::Medium);

    assert!(h.sessions.proposal("amy").is_none(), "proposal cleared after creation");
}

#[tokio::test]
async fn test_no_silent_creation() {
    let h = Harness::deterministic();

    // A proposal goes pending, then a stream of non-confirming messages
    h.engine.handle_at("amy", "gym tomorrow at 7am", morning()).await;
    for text in ["hey", "friday", "what about the weather", "dentist appointment"] {
        h.engine.handle_at("amy", text, morning()).await;
    }

    assert!(h.store.is_empty(), "nothing may be created without an exact confirmation");
}

#[tokio::test]
async fn test_at_most_one_pending_proposal() {
    let h = Harness::deterministic();

    h.engine.handle_at("amy", "gym tomorrow at 7am", morning()).await;
    // Unrelated new request supersedes the old proposal entirely
    h.engine.handle_at("amy", "dentist appointment", morning()).await;

    let proposal = h.sessions.proposal("amy").expect("one proposal pending");
    match proposal.payload {
        taskchat::domain::ProposalPayload::Task(draft) => assert_eq!(draft.title, "Dentist appointment"),
        _ => panic!("expected task proposal"),
    }

    // Confirming creates only the superseding task
    h.engine.handle_at("amy", "yes", morning()).await;
    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Dentist appointment");
}

// =============================================================================
// Transitions
// =============================================================================

#[tokio::test]
async fn test_greeting_preserves_context() {
    let h = Harness::deterministic();

    h.engine.handle_at("amy", "gym tomorrow at 7am", morning()).await;
    let before = h.sessions.proposal("amy").unwrap();

    let reply = h.engine.handle_at("amy", "hey", morning()).await;
    assert!(reply.message.contains("\"Gym\""), "greeting reply restates the title");
    assert!(reply.requires_confirmation);

    let after = h.sessions.proposal("amy").unwrap();
    assert_eq!(
        format!("{:?}", before.payload),
        format!("{:?}", after.payload),
        "proposal unchanged by greeting"
    );

    // Context survived: confirming still works
    h.engine.handle_at("amy", "ok", morning()).await;
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_rejection_drops_proposal() {
    let h = Harness::deterministic();

    h.engine.handle_at("amy", "gym tomorrow at 7am", morning()).await;
    let reply = h.engine.handle_at("amy", "not now", morning()).await;
    assert!(reply.success);
    assert!(h.sessions.proposal("amy").is_none());

    // A later confirmation has nothing to act on
    h.engine.handle_at("amy", "cancel it.", morning()).await;
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_date_adjustment_preserves_time() {
    let h = Harness::deterministic();

    // Default slot on Wednesday morning: today 16:00-17:00
    h.engine.handle_at("amy", "dentist appointment", morning()).await;

    let reply = h.engine.handle_at("amy", "tuesday", morning()).await;
    assert!(reply.requires_confirmation);

    h.engine.handle_at("amy", "confirm", morning()).await;
    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    // Next Tuesday from Wed 2025-01-01, window moved but time kept
    assert_eq!(tasks[0].start, datetime(2025, 1, 7, 16, 0));
    assert_eq!(tasks[0].end, datetime(2025, 1, 7, 17, 0));
}

#[tokio::test]
async fn test_today_rollover() {
    let h = Harness::deterministic();

    // 17:00 has already passed at 20:00, so "today" means tomorrow
    h.engine.handle_at("amy", "study today at 5pm", evening()).await;
    h.engine.handle_at("amy", "confirm", evening()).await;

    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].start, datetime(2025, 1, 2, 17, 0));
}

#[tokio::test]
async fn test_bare_create_asks_for_details() {
    let h = Harness::deterministic();

    let reply = h.engine.handle_at("amy", "create a task", morning()).await;
    assert!(reply.success);
    assert!(!reply.requires_confirmation);
    assert!(h.sessions.proposal("amy").is_none(), "bare request creates no proposal");
}

// =============================================================================
// Assist-backed flows
// =============================================================================

#[tokio::test]
async fn test_assist_proposal_gated_by_confirmation() {
    let llm = Arc::new(ScriptedLlm::new(&[
        r#"{"assistant_message": "How about tomorrow at 7?", "action": {"type": "propose_task", "title": "Morning run", "start": "2025-01-02 07:00", "end": "2025-01-02 07:45", "priority": "high"}}"#,
    ]));
    let h = Harness::with_assist(llm);

    let reply = h
        .engine
        .handle_at("amy", "I want to start running tomorrow morning", morning())
        .await;
    assert!(reply.requires_confirmation);
    assert!(h.store.is_empty());

    h.engine.handle_at("amy", "go ahead please", morning()).await;
    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Morning run");
    assert_eq!(tasks[0].start, datetime(2025, 1, 2, 7, 0));
    assert_eq!(tasks[0].priority, calstore::Priority::High);
}

#[tokio::test]
async fn test_legacy_create_task_action_still_requires_confirmation() {
    let llm = Arc::new(ScriptedLlm::new(&[
        r#"{"assistant_message": "Done!", "action": {"type": "create_task", "title": "Review taxes", "start": "2025-01-03 10:00", "end": "2025-01-03 11:00", "priority": "medium"}}"#,
    ]));
    let h = Harness::with_assist(llm);

    h.engine
        .handle_at("amy", "I need to sort out my taxes on friday", morning())
        .await;
    assert!(
        h.store.is_empty(),
        "legacy create_task must not bypass the confirmation gate"
    );
    assert!(h.sessions.proposal("amy").is_some());

    h.engine.handle_at("amy", "yes", morning()).await;
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_malformed_model_output_never_creates_a_task() {
    let llm = Arc::new(ScriptedLlm::new(&[
        "no braces in sight",
        r#"{"action": {"type": "none"}}"#,
    ]));
    let h = Harness::with_assist(llm);

    // Raw prose with no JSON
    let reply = h
        .engine
        .handle_at("amy", "book something for my trip tomorrow", morning())
        .await;
    assert!(reply.success);
    assert!(!reply.requires_confirmation);
    assert!(h.store.is_empty());
    assert!(h.sessions.proposal("amy").is_none());

    // JSON missing assistant_message
    let reply = h
        .engine
        .handle_at("amy", "book something for my trip tomorrow", morning())
        .await;
    assert!(!reply.requires_confirmation);
    assert!(h.store.is_empty());
    assert!(h.sessions.proposal("amy").is_none());
}

#[tokio::test]
async fn test_assist_timeout_falls_back_gracefully() {
    let h = Harness::with_assist_timeout(Arc::new(StalledLlm), Duration::from_millis(50));

    let reply = h
        .engine
        .handle_at("amy", "book something for my trip tomorrow", morning())
        .await;
    assert!(reply.success);
    assert!(reply.message.contains("trouble responding"));
    assert!(h.store.is_empty());
    assert!(h.sessions.proposal("amy").is_none());
}

#[tokio::test]
async fn test_plan_flow_creates_all_sessions_on_confirm() {
    let llm = Arc::new(ScriptedLlm::new(&[
        r#"{
            "intent": "multi_schedule",
            "tasks": [
                {"taskTitle": "Bench day", "weekday": "monday", "time": "6pm", "priority": "medium"},
                {"taskTitle": "Incline day", "weekday": "friday", "time": "6pm", "priority": "medium"}
            ],
            "requiresTimeConfirmation": false,
            "requiresClarification": false
        }"#,
    ]));
    let h = Harness::with_assist(llm);

    let reply = h.engine.handle_at("amy", "plan a chest workout week", morning()).await;
    assert!(reply.requires_confirmation);
    assert!(reply.message.contains("Bench day"));
    assert!(h.store.is_empty());

    let reply = h.engine.handle_at("amy", "confirm", morning()).await;
    assert!(reply.message.contains("2 tasks"));

    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);
    // Weekdays resolved deterministically from Wed 2025-01-01
    assert_eq!(tasks[0].start, datetime(2025, 1, 6, 18, 0));
    assert_eq!(tasks[1].start, datetime(2025, 1, 3, 18, 0));
}

#[tokio::test]
async fn test_plan_flow_without_assist_uses_template_week() {
    let h = Harness::deterministic();

    let reply = h.engine.handle_at("amy", "plan a chest workout week", morning()).await;
    assert!(reply.requires_confirmation);

    h.engine.handle_at("amy", "confirm", morning()).await;
    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 3);
}

// =============================================================================
// Error paths
// =============================================================================

#[tokio::test]
async fn test_stale_confirmation_clears_and_asks_to_restate() {
    let llm = Arc::new(ScriptedLlm::new(&[
        r#"{"assistant_message": "Okay?", "action": {"type": "propose_task", "title": "Gym", "start": "whenever", "end": "later", "priority": "medium"}}"#,
    ]));
    let h = Harness::with_assist(llm);

    h.engine.handle_at("amy", "book me some gym time tomorrow", morning()).await;
    assert!(h.sessions.proposal("amy").is_some());

    let reply = h.engine.handle_at("amy", "confirm", morning()).await;
    assert!(reply.success);
    assert!(reply.message.to_lowercase().contains("restate"));
    assert!(h.store.is_empty(), "unparseable window must not create a task");
    assert!(h.sessions.proposal("amy").is_none());
}

#[tokio::test]
async fn test_materialization_failure_surfaces() {
    let h = Harness::deterministic();
    h.store.reject_creates("calendar backend offline");

    h.engine.handle_at("amy", "gym tomorrow at 7am", morning()).await;
    let reply = h.engine.handle_at("amy", "confirm", morning()).await;

    assert!(!reply.success, "store failure must not be swallowed");
    assert!(reply.message.contains("calendar backend offline"));
    assert!(h.sessions.proposal("amy").is_none(), "proposal cleared after the attempt");
}

#[tokio::test]
async fn test_users_do_not_share_proposals() {
    let h = Harness::deterministic();

    h.engine.handle_at("amy", "gym tomorrow at 7am", morning()).await;
    let reply = h.engine.handle_at("bob", "confirm", morning()).await;

    // Bob has nothing pending; his "confirm" is just a new topic
    assert!(h.store.is_empty());
    assert!(reply.success);

    h.engine.handle_at("amy", "confirm", morning()).await;
    let tasks = h.store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Gym");
}
