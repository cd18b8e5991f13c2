//! Session store trait — durable, append-only conversation logs.
//!
//! A store keeps one ordered message sequence per [`SessionId`]. Appends to
//! different sessions may run concurrently; a single session only ever has
//! one active turn, and implementations serialize its appends.

use crate::error::StoreError;
use crate::message::{Message, Role, SessionId, ToolCall};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};

/// The core SessionStore trait.
///
/// Implementations: SQLite, JSON-lines files, in-memory (for testing).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "jsonl", "memory").
    fn name(&self) -> &str;

    /// Durably append one message to a session.
    ///
    /// Either the whole message is recorded or none of it.
    async fn append(&self, session: &SessionId, message: &Message) -> Result<(), StoreError>;

    /// All messages of a session in append order; empty for a new session.
    async fn load(&self, session: &SessionId) -> Result<Vec<Message>, StoreError>;

    /// Every session id the store knows about.
    async fn list_session_ids(&self) -> Result<BTreeSet<SessionId>, StoreError>;

    /// Release underlying resources. Called once at shutdown.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A violation of the tool request/result pairing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingViolation {
    /// A tool message answers a call that is not pending.
    UnexpectedResult { index: usize, call_id: String },
    /// A new assistant/user message arrived while calls were still pending.
    Unanswered { index: usize, call_ids: Vec<String> },
}

/// Check that every tool call in `messages` is answered exactly once before
/// the next assistant or user message.
///
/// Calls still pending at the very end are allowed: that is the state of a
/// turn interrupted between persisting a request and its results. See
/// [`pending_calls`] for closing them before the session continues.
pub fn validate_pairing(messages: &[Message]) -> Result<(), PairingViolation> {
    let mut pending: HashSet<String> = HashSet::new();

    for (index, message) in messages.iter().enumerate() {
        match message.role {
            Role::Tool => {
                let call_id = message.tool_call_id.clone().unwrap_or_default();
                if !pending.remove(&call_id) {
                    return Err(PairingViolation::UnexpectedResult { index, call_id });
                }
            }
            Role::Assistant | Role::User => {
                if !pending.is_empty() {
                    let mut call_ids: Vec<String> = pending.drain().collect();
                    call_ids.sort();
                    return Err(PairingViolation::Unanswered { index, call_ids });
                }
                pending.extend(message.tool_calls.iter().map(|c| c.id.clone()));
            }
            Role::System => {}
        }
    }
    Ok(())
}

/// Tool calls of the last assistant request that still have no result.
///
/// Empty unless the history ends in the middle of a tool round.
pub fn pending_calls(messages: &[Message]) -> Vec<ToolCall> {
    let Some(start) = messages.iter().rposition(|m| m.role != Role::Tool) else {
        return Vec::new();
    };
    let request = &messages[start];
    if request.role != Role::Assistant {
        return Vec::new();
    }
    let answered: HashSet<&str> = messages[start + 1..]
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    request
        .tool_calls
        .iter()
        .filter(|c| !answered.contains(c.id.as_str()))
        .cloned()
        .collect()
}
