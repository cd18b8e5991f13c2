//! Turn events — observe a turn without coupling to the loop.
//!
//! The turn controller publishes an event at each state change. The CLI
//! uses them for progress output; tests use them to check ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything a turn reports while it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    /// The user message was persisted and the turn started
    TurnStarted {
        session_id: String,
        history_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// The model asked for tools
    ToolsRequested {
        session_id: String,
        round: u32,
        tool_names: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A tool finished (successfully or with an error payload)
    ToolExecuted {
        session_id: String,
        tool_name: String,
        call_id: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The model produced its final answer
    TurnCompleted {
        session_id: String,
        rounds: u32,
        timestamp: DateTime<Utc>,
    },

    /// The turn stopped on an error
    TurnFailed {
        session_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for turn events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<TurnEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: TurnEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TurnEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
