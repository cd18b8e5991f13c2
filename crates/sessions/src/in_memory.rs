//! In-memory store — useful for testing and throwaway sessions.

use async_trait::async_trait;
use parley_core::error::StoreError;
use parley_core::message::{Message, SessionId};
use parley_core::session::SessionStore;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Keeps every session in a map of vectors. Nothing survives a restart.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, session: &SessionId, message: &Message) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn load(&self, session: &SessionId) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_session_ids(&self) -> Result<BTreeSet<SessionId>, StoreError> {
        Ok(self.sessions.read().await.keys().cloned().collect())
    }
}
