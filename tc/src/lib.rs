//! TaskChat - conversational scheduling decision engine
//!
//! Turns free-text scheduling intents ("study tomorrow at 5pm", "plan a
//! chest workout week") into confirmed calendar tasks via a strict
//! propose/confirm protocol: no task is ever created without an explicit,
//! validated user confirmation.
//!
//! # Core Concepts
//!
//! - **Decision gate**: every create goes through a pending proposal the
//!   user must confirm in so many words
//! - **Deterministic date math**: the generative assist may name tokens,
//!   but all date resolution is done by the extractor and slot resolver
//! - **Graceful degradation**: a slow, dead or babbling model can only
//!   ever produce a clarification or apology, never a task
//! - **Transient state**: per-user history and proposals live for the
//!   process lifetime only
//!
//! # Modules
//!
//! - [`extract`] - deterministic date/time extraction
//! - [`classify`] - ordered utterance classification rules
//! - [`assist`] - generative assist adapter with strict output contract
//! - [`engine`] - the confirmation state machine
//! - [`session`] - per-user history and proposal storage
//! - [`materialize`] - confirmed proposals to task-creation calls
//! - [`llm`] - LLM client trait and Anthropic implementation

pub mod assist;
pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod extract;
pub mod llm;
pub mod materialize;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use assist::{AssistAction, AssistAdapter, AssistError, AssistReply};
pub use classify::{PendingKind, Utterance, classify};
pub use config::{AssistConfig, Config, LlmConfig, SlotsConfig};
pub use domain::{
    Intent, PendingProposal, PlanDraft, ProposalPayload, SchedulingExtraction, TaskDraft, TaskSignals,
};
pub use engine::{ChatEngine, Reply, SlotPolicy};
pub use extract::{Extracted, extract, has_schedule_token};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, Message};
pub use materialize::{MaterializeReport, Materializer};
pub use session::{HISTORY_CAP, MemorySessionStore, SessionStore};
