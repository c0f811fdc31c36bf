//! Per-user session state
//!
//! Holds the rolling conversation history and the single pending-proposal
//! slot for each user. State lives for the process lifetime only; nothing
//! is persisted. The store is injected into the engine as a trait so the
//! state machine itself stays pure and testable.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::domain::PendingProposal;
use crate::llm::Message;

/// Maximum retained conversation turns (5 user/assistant pairs)
pub const HISTORY_CAP: usize = 10;

/// Keyed session storage: rolling history plus at most one pending
/// proposal per user
///
/// Implementations are shared across concurrent requests; the engine
/// assumes at most one in-flight message per user, and the later write
/// wins when that assumption is violated.
pub trait SessionStore: Send + Sync {
    /// Conversation history for a user, oldest first
    fn history(&self, user_id: &str) -> Vec<Message>;

    /// Append a turn, evicting the oldest beyond [`HISTORY_CAP`]
    fn record_turn(&self, user_id: &str, message: Message);

    /// The user's pending proposal, if any
    fn proposal(&self, user_id: &str) -> Option<PendingProposal>;

    /// Replace the user's pending proposal
    fn set_proposal(&self, user_id: &str, proposal: PendingProposal);

    /// Drop the user's pending proposal
    fn clear_proposal(&self, user_id: &str);
}

#[derive(Debug, Default)]
struct Session {
    history: Vec<Message>,
    proposal: Option<PendingProposal>,
}

/// Process-wide in-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn history(&self, user_id: &str) -> Vec<Message> {
        self.sessions
            .lock()
            .unwrap()
            .get(user_id)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    fn record_turn(&self, user_id: &str, message: Message) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(user_id.to_string()).or_default();
        session.history.push(message);
        while session.history.len() > HISTORY_CAP {
            session.history.remove(0);
        }
    }

    fn proposal(&self, user_id: &str) -> Option<PendingProposal> {
        self.sessions
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(|s| s.proposal.clone())
    }

    fn set_proposal(&self, user_id: &str, proposal: PendingProposal) {
        debug!(%user_id, "set_proposal: replacing pending proposal");
        let mut sessions = self.sessions.lock().unwrap();
        sessions.entry(user_id.to_string()).or_default().proposal = Some(proposal);
    }

    fn clear_proposal(&self, user_id: &str) {
        debug!(%user_id, "clear_proposal: called");
        if let Some(session) = self.sessions.lock().unwrap().get_mut(user_id) {
            session.proposal = None;
        }
    }
}
