//! Generative assist adapter
//!
//! Optional enrichment step between the classifier and the state machine.
//! Sends a bounded instruction plus the short rolling history to an
//! external model, enforces a strict JSON contract, and degrades
//! gracefully: a timeout, transport error or malformed response can never
//! reach the state machine as anything other than a safe fallback reply.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompt;
mod validate;

pub use validate::{extract_json, parse_reply, parse_signals};

use crate::domain::{PlanDraft, SchedulingExtraction, TaskDraft};
use crate::llm::{CompletionRequest, LlmClient, Message};

/// Attempts allowed on the structured extraction path
const SIGNAL_ATTEMPTS: u32 = 3;

/// Errors from the assist adapter
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("Assist output malformed: {0}")]
    Malformed(String),

    #[error("Assist output unparseable after {0} attempts")]
    Unparseable(u32),

    #[error("Assist unavailable: {0}")]
    Unavailable(String),
}

/// Action declared by a conversational assist reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistAction {
    /// Propose a single task (includes legacy `create_task` declarations)
    ProposeTask(TaskDraft),
    /// Propose a multi-task plan
    ProposePlan(PlanDraft),
    /// Ask the user a clarifying question
    Clarify,
    /// Plain conversation, nothing to schedule
    None,
}

/// Validated conversational reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistReply {
    pub assistant_message: String,
    pub action: AssistAction,
}

impl AssistReply {
    /// Built-in fallback for timeouts and transport errors
    fn unavailable() -> Self {
        Self {
            assistant_message: prompt::UNAVAILABLE_MESSAGE.to_string(),
            action: AssistAction::None,
        }
    }

    /// Built-in degrade for output that failed validation
    fn malformed() -> Self {
        Self {
            assistant_message: prompt::MALFORMED_MESSAGE.to_string(),
            action: AssistAction::Clarify,
        }
    }
}

/// Adapter around the generative-model capability
pub struct AssistAdapter {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
    max_tokens: u32,
}

impl AssistAdapter {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration, max_tokens: u32) -> Self {
        Self {
            llm,
            timeout,
            max_tokens,
        }
    }

    /// Conversational turn: message + short history in, validated reply out
    ///
    /// Infallible by design - every failure mode maps to a safe built-in
    /// reply. `reference_now` anchors the timestamps the model may emit.
    pub async fn respond(&self, message: &str, history: &[Message], reference_now: NaiveDateTime) -> AssistReply {
        let system_prompt = format!(
            "{}\n\nCurrent local time: {} ({})",
            prompt::CONVERSATION_SYSTEM,
            reference_now.format("%Y-%m-%d %H:%M"),
            reference_now.weekday()
        );

        let raw = match self.invoke(system_prompt, message, history).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "respond: model unavailable, using fallback");
                return AssistReply::unavailable();
            }
        };

        match parse_reply(&raw) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "respond: output failed validation, degrading to clarification");
                AssistReply::malformed()
            }
        }
    }

    /// Structured extraction: scheduling signals only, no date arithmetic
    ///
    /// Up to three attempts against validation failures; a timeout or
    /// transport error ends the loop immediately (no retry after the
    /// wall-clock bound). After three malformed responses the caller gets
    /// a definitive unparseable failure, never a best-effort guess.
    pub async fn extract_signals(
        &self,
        message: &str,
        history: &[Message],
    ) -> Result<SchedulingExtraction, AssistError> {
        for attempt in 1..=SIGNAL_ATTEMPTS {
            let raw = self
                .invoke(prompt::SIGNALS_SYSTEM.to_string(), message, history)
                .await
                .map_err(|e| AssistError::Unavailable(e.to_string()))?;

            match parse_signals(&raw) {
                Ok(extraction) => {
                    debug!(attempt, task_count = extraction.tasks.len(), "extract_signals: validated");
                    return Ok(extraction);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "extract_signals: attempt failed validation");
                }
            }
        }
        Err(AssistError::Unparseable(SIGNAL_ATTEMPTS))
    }

    /// One bounded model call; returns the raw untrusted text
    async fn invoke(&self, system_prompt: String, message: &str, history: &[Message]) -> Result<String, AssistError> {
        let mut messages = history.to_vec();
        messages.push(Message::user(message));

        let request = CompletionRequest {
            system_prompt,
            messages,
            max_tokens: self.max_tokens,
        };

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| AssistError::Unavailable(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| AssistError::Unavailable(e.to_string()))?;

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "invoke: completed"
        );

        response
            .content
            .ok_or_else(|| AssistError::Malformed("model returned no text".to_string()))
    }
}
