//! The caller-facing assistant.
//!
//! Wraps a [`TurnController`] and the session store behind the handful of
//! operations a front end needs: send a message, list sessions, read a
//! transcript.

use crate::executor::ToolExecutor;
use crate::turn::TurnController;
use parley_config::AgentSettings;
use parley_core::error::AgentError;
use parley_core::event::EventBus;
use parley_core::gateway::ModelGateway;
use parley_core::locks::SessionLocks;
use parley_core::message::{Message, SessionId};
use parley_core::session::SessionStore;
use parley_core::tool::{ToolDefinition, ToolRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

pub struct Assistant {
    controller: TurnController,
    store: Arc<dyn SessionStore>,
    events: Arc<EventBus>,
    active_turns: SessionLocks,
}

impl Assistant {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<dyn SessionStore>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self::with_settings(gateway, store, registry, &AgentSettings::default())
    }

    /// Create an assistant using the turn bound and system prompt from config.
    pub fn with_settings(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<dyn SessionStore>,
        registry: Arc<ToolRegistry>,
        settings: &AgentSettings,
    ) -> Self {
        let events = Arc::new(EventBus::default());
        let mut controller = TurnController::new(
            gateway,
            store.clone(),
            ToolExecutor::new(registry),
            events.clone(),
        )
        .with_max_rounds(settings.max_tool_rounds);
        if let Some(prompt) = &settings.system_prompt {
            controller = controller.with_system_prompt(prompt.clone());
        }

        Self {
            controller,
            store,
            events,
            active_turns: SessionLocks::default(),
        }
    }

    /// Turn events for progress display.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Run one turn and return the final answer.
    ///
    /// Turns on the same session queue behind each other; turns on
    /// different sessions run concurrently.
    pub async fn send_message(&self, session: &SessionId, text: &str) -> Result<String, AgentError> {
        let _guard = self.active_turns.acquire(session).await;
        let outcome = self.controller.run(session, text).await?;
        Ok(outcome.answer)
    }

    pub async fn list_sessions(&self) -> Result<BTreeSet<SessionId>, AgentError> {
        Ok(self.store.list_session_ids().await?)
    }

    /// Full transcript of a session, empty if it does not exist.
    pub async fn history(&self, session: &SessionId) -> Result<Vec<Message>, AgentError> {
        Ok(self.store.load(session).await?)
    }

    pub fn new_session_id(&self) -> SessionId {
        SessionId::generate()
    }

    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.controller.executor().registry().describe_all()
    }

    /// Close the session store. Call once, on the way out.
    pub async fn shutdown(&self) -> Result<(), AgentError> {
        debug!(store = self.store.name(), "Closing session store");
        Ok(self.store.close().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedGateway, answer, tool_calls};
    use parley_core::message::{Role, ToolCall};
    use parley_core::session::validate_pairing;
    use parley_sessions::InMemorySessionStore;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(parley_tools::CalculatorTool)).unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn send_message_returns_answer_and_lists_sessions() {
        let gateway = Arc::new(ScriptedGateway::answers(vec![answer("hi a"), answer("hi b")]));
        let assistant = Assistant::new(gateway, Arc::new(InMemorySessionStore::new()), registry());

        assert_eq!(
            assistant.send_message(&"a".into(), "hello").await.unwrap(),
            "hi a"
        );
        assert_eq!(
            assistant.send_message(&"b".into(), "hello").await.unwrap(),
            "hi b"
        );

        assert_eq!(
            assistant.list_sessions().await.unwrap(),
            BTreeSet::from([SessionId::from("a"), SessionId::from("b")])
        );
    }

    #[tokio::test]
    async fn history_is_the_stored_transcript() {
        let gateway = Arc::new(ScriptedGateway::answers(vec![
            tool_calls(vec![ToolCall::new(
                "c1",
                "calculator",
                serde_json::json!({"first_num": 6, "second_num": 7, "operation": "mul"}),
            )]),
            answer("42"),
        ]));
        let assistant = Assistant::new(gateway, Arc::new(InMemorySessionStore::new()), registry());
        let id = assistant.new_session_id();

        assistant.send_message(&id, "6 times 7?").await.unwrap();

        let history = assistant.history(&id).await.unwrap();
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert!(validate_pairing(&history).is_ok());
        assert!(assistant.history(&"missing".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finished_turns_release_their_session_lock() {
        let replies = (0..20).map(|i| answer(&format!("reply {i}"))).collect();
        let gateway = Arc::new(ScriptedGateway::answers(replies));
        let assistant = Assistant::new(gateway, Arc::new(InMemorySessionStore::new()), registry());

        for _ in 0..20 {
            let id = assistant.new_session_id();
            assistant.send_message(&id, "hello").await.unwrap();
        }
        assert_eq!(assistant.active_turns.tracked(), 0);
    }

    #[tokio::test]
    async fn settings_bound_the_turn() {
        let gateway = Arc::new(ScriptedGateway::always(tool_calls(vec![ToolCall::new(
            "c",
            "calculator",
            serde_json::json!({"first_num": 1, "second_num": 1, "operation": "add"}),
        )])));
        let settings = AgentSettings {
            max_tool_rounds: 1,
            system_prompt: None,
        };
        let assistant = Assistant::with_settings(
            gateway,
            Arc::new(InMemorySessionStore::new()),
            registry(),
            &settings,
        );

        let err = assistant.send_message(&"s".into(), "go").await.unwrap_err();
        assert!(matches!(err, AgentError::TurnBudgetExceeded { rounds: 1 }));
    }

    #[test]
    fn new_session_ids_are_unique() {
        let gateway = Arc::new(ScriptedGateway::answers(vec![]));
        let assistant = Assistant::new(gateway, Arc::new(InMemorySessionStore::new()), registry());
        assert_ne!(assistant.new_session_id(), assistant.new_session_id());
        assert_eq!(assistant.tools().len(), 1);
    }
}
