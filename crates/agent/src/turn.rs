//! The turn controller — drives one user message to a final answer.
//!
//! A turn is a small state machine:
//!
//! 1. **AwaitingModel**: ask the gateway what to do with the history
//! 2. **ExecutingTools**: run each requested call in order, persisting
//!    every result before the next one starts
//! 3. **Done**: the model answered in plain text
//!
//! Every message is appended to the session store the moment it joins the
//! history, so an interrupted turn can be resumed from what was saved. Calls
//! an interrupted turn left unanswered are closed with an error result
//! before the next user message is stored.

use crate::executor::ToolExecutor;
use chrono::Utc;
use parley_core::error::AgentError;
use parley_core::event::{EventBus, TurnEvent};
use parley_core::gateway::{ModelDecision, ModelGateway};
use parley_core::message::{Message, SessionId, ToolCall};
use parley_core::session::{SessionStore, pending_calls};
use parley_core::tool::ToolResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default bound on tool rounds per turn.
pub const DEFAULT_MAX_ROUNDS: u32 = 8;

const INTERRUPTED: &str = "Tool call interrupted";

/// Where a turn currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    Done(String),
}

/// The result of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub answer: String,

    /// Tool rounds executed
    pub rounds: u32,

    /// Every state the turn passed through, ending with `Done`
    pub trail: Vec<TurnState>,
}

pub struct TurnController {
    gateway: Arc<dyn ModelGateway>,
    store: Arc<dyn SessionStore>,
    executor: ToolExecutor,
    events: Arc<EventBus>,
    max_rounds: u32,
    system_prompt: Option<String>,
}

impl TurnController {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<dyn SessionStore>,
        executor: ToolExecutor,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            gateway,
            store,
            executor,
            events,
            max_rounds: DEFAULT_MAX_ROUNDS,
            system_prompt: None,
        }
    }

    /// Set the maximum number of tool rounds per turn.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    /// Prepend a system prompt to every model request. It is never stored.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Run one turn for `user_text` in `session`.
    pub async fn run(&self, session: &SessionId, user_text: &str) -> Result<TurnOutcome, AgentError> {
        match self.drive(session, user_text).await {
            Ok(outcome) => {
                self.events.publish(TurnEvent::TurnCompleted {
                    session_id: session.to_string(),
                    rounds: outcome.rounds,
                    timestamp: Utc::now(),
                });
                Ok(outcome)
            }
            Err(e) => {
                warn!(session = %session, error = %e, "Turn failed");
                self.events.publish(TurnEvent::TurnFailed {
                    session_id: session.to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    async fn drive(&self, session: &SessionId, user_text: &str) -> Result<TurnOutcome, AgentError> {
        let mut history = self.store.load(session).await?;
        for call in pending_calls(&history) {
            warn!(session = %session, tool = %call.name, call_id = %call.id, "Closing tool call left by an interrupted turn");
            let result = ToolResult::error(&call.id, INTERRUPTED);
            self.persist(session, &mut history, ToolExecutor::to_message(&result))
                .await?;
        }
        self.persist(session, &mut history, Message::user(user_text))
            .await?;

        info!(session = %session, messages = history.len(), "Processing turn");
        self.events.publish(TurnEvent::TurnStarted {
            session_id: session.to_string(),
            history_len: history.len(),
            timestamp: Utc::now(),
        });

        let tools = self.executor.registry().describe_all();
        let mut rounds = 0u32;
        let mut trail = Vec::new();
        let mut state = TurnState::AwaitingModel;

        loop {
            trail.push(state.clone());
            state = match state {
                TurnState::AwaitingModel => {
                    let request = self.model_request(&history);
                    let decision = self.gateway.decide(&request, &tools).await?;

                    match decision {
                        ModelDecision::FinalAnswer(ref text) => {
                            let text = text.clone();
                            self.persist(session, &mut history, decision.to_message())
                                .await?;
                            TurnState::Done(text)
                        }
                        ModelDecision::ToolCalls { ref calls, .. } => {
                            // The over-budget request is dropped unstored, so
                            // the saved history keeps every call answered.
                            if rounds >= self.max_rounds {
                                warn!(session = %session, rounds, "Tool round budget exhausted");
                                return Err(AgentError::TurnBudgetExceeded { rounds });
                            }
                            rounds += 1;
                            let calls = calls.clone();
                            self.events.publish(TurnEvent::ToolsRequested {
                                session_id: session.to_string(),
                                round: rounds,
                                tool_names: calls.iter().map(|c| c.name.clone()).collect(),
                                timestamp: Utc::now(),
                            });
                            self.persist(session, &mut history, decision.to_message())
                                .await?;
                            TurnState::ExecutingTools(calls)
                        }
                    }
                }

                TurnState::ExecutingTools(calls) => {
                    debug!(session = %session, round = rounds, count = calls.len(), "Executing tool calls");
                    for call in &calls {
                        let start = Instant::now();
                        let result = self.executor.execute(call).await;
                        self.events.publish(TurnEvent::ToolExecuted {
                            session_id: session.to_string(),
                            tool_name: call.name.clone(),
                            call_id: call.id.clone(),
                            success: !result.is_error(),
                            duration_ms: start.elapsed().as_millis() as u64,
                            timestamp: Utc::now(),
                        });
                        self.persist(session, &mut history, ToolExecutor::to_message(&result))
                            .await?;
                    }
                    TurnState::AwaitingModel
                }

                TurnState::Done(answer) => {
                    info!(session = %session, rounds, "Turn complete");
                    return Ok(TurnOutcome {
                        answer,
                        rounds,
                        trail,
                    });
                }
            };
        }
    }

    /// Store `message`, then add it to the in-memory history.
    async fn persist(
        &self,
        session: &SessionId,
        history: &mut Vec<Message>,
        message: Message,
    ) -> Result<(), AgentError> {
        self.store.append(session, &message).await?;
        history.push(message);
        Ok(())
    }

    fn model_request(&self, history: &[Message]) -> Vec<Message> {
        match &self.system_prompt {
            Some(prompt) => std::iter::once(Message::system(prompt.clone()))
                .chain(history.iter().cloned())
                .collect(),
            None => history.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedGateway, answer, tool_calls};
    use parley_core::error::GatewayError;
    use parley_core::message::Role;
    use parley_core::session::validate_pairing;
    use parley_core::tool::ToolRegistry;
    use parley_sessions::InMemorySessionStore;
    use parley_tools::CalculatorTool;

    struct Harness {
        gateway: Arc<ScriptedGateway>,
        store: Arc<InMemorySessionStore>,
        events: Arc<EventBus>,
        controller: TurnController,
    }

    fn harness(gateway: ScriptedGateway) -> Harness {
        let gateway = Arc::new(gateway);
        let store = Arc::new(InMemorySessionStore::new());
        let events = Arc::new(EventBus::default());
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CalculatorTool)).unwrap();
        let controller = TurnController::new(
            gateway.clone(),
            store.clone(),
            ToolExecutor::new(Arc::new(registry)),
            events.clone(),
        );
        Harness {
            gateway,
            store,
            events,
            controller,
        }
    }

    fn add(id: &str, a: f64, b: f64) -> ToolCall {
        ToolCall::new(
            id,
            "calculator",
            serde_json::json!({"first_num": a, "second_num": b, "operation": "add"}),
        )
    }

    #[tokio::test]
    async fn single_round_trip() {
        let h = harness(ScriptedGateway::answers(vec![answer("Hello! How can I help?")]));
        let id = SessionId::from("s");

        let outcome = h.controller.run(&id, "Hello!").await.unwrap();
        assert_eq!(outcome.answer, "Hello! How can I help?");
        assert_eq!(outcome.rounds, 0);
        assert_eq!(
            outcome.trail,
            vec![
                TurnState::AwaitingModel,
                TurnState::Done("Hello! How can I help?".into())
            ]
        );

        let stored = h.store.load(&id).await.unwrap();
        let roles: Vec<Role> = stored.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
        assert_eq!(h.gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn two_tools_run_in_order_and_persist_before_next_call() {
        let calls = vec![add("call_a", 2.0, 3.0), add("call_b", 10.0, 5.0)];
        let h = harness(ScriptedGateway::answers(vec![
            tool_calls(calls.clone()),
            answer("5 and 15"),
        ]));
        let id = SessionId::from("math");

        let outcome = h.controller.run(&id, "Add 2+3 and 10+5").await.unwrap();
        assert_eq!(outcome.answer, "5 and 15");
        assert_eq!(outcome.rounds, 1);
        assert_eq!(
            outcome.trail,
            vec![
                TurnState::AwaitingModel,
                TurnState::ExecutingTools(calls),
                TurnState::AwaitingModel,
                TurnState::Done("5 and 15".into()),
            ]
        );

        // The second gateway call already sees both results, in call order
        let second = h.gateway.history_at(1);
        let answered: Vec<Option<&str>> = second
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(answered, [Some("call_a"), Some("call_b")]);

        let stored = h.store.load(&id).await.unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(&stored[..4], &second[..]);
        assert!(stored[2].content.contains("5.0"));
        assert!(stored[3].content.contains("15.0"));
        assert!(validate_pairing(&stored).is_ok());
    }

    #[tokio::test]
    async fn budget_exceeded_keeps_history_valid() {
        let h = harness(ScriptedGateway::always(tool_calls(vec![add("loop", 1.0, 1.0)])));
        let controller = h.controller.with_max_rounds(2);
        let id = SessionId::from("loopy");

        let err = controller.run(&id, "never stop").await.unwrap_err();
        assert!(matches!(err, AgentError::TurnBudgetExceeded { rounds: 2 }));
        assert_eq!(h.gateway.call_count(), 3);

        let stored = h.store.load(&id).await.unwrap();
        // user + 2 × (assistant request, tool result)
        assert_eq!(stored.len(), 5);
        assert_eq!(stored.last().unwrap().role, Role::Tool);
        assert!(validate_pairing(&stored).is_ok());
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_after_user_message_is_saved() {
        let h = harness(ScriptedGateway::new(vec![Err(GatewayError::Unavailable(
            "connection refused".into(),
        ))]));
        let id = SessionId::from("offline");
        let mut rx = h.events.subscribe();

        let err = h.controller.run(&id, "anyone there?").await.unwrap_err();
        assert!(matches!(err, AgentError::Gateway(GatewayError::Unavailable(_))));

        let stored = h.store.load(&id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "anyone there?");

        assert!(matches!(*rx.recv().await.unwrap(), TurnEvent::TurnStarted { .. }));
        assert!(matches!(*rx.recv().await.unwrap(), TurnEvent::TurnFailed { .. }));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_the_model() {
        let h = harness(ScriptedGateway::answers(vec![
            tool_calls(vec![ToolCall::new("c1", "teleport", serde_json::json!({}))]),
            answer("I cannot teleport."),
        ]));
        let id = SessionId::from("s");

        let outcome = h.controller.run(&id, "beam me up").await.unwrap();
        assert_eq!(outcome.answer, "I cannot teleport.");

        let stored = h.store.load(&id).await.unwrap();
        assert_eq!(stored[2].content, r#"{"error":"Unsupported operation 'teleport'"}"#);
    }

    #[tokio::test]
    async fn resumed_session_sends_prior_history() {
        let h = harness(ScriptedGateway::answers(vec![answer("first"), answer("second")]));
        let id = SessionId::from("resume");

        h.controller.run(&id, "one").await.unwrap();
        h.controller.run(&id, "two").await.unwrap();

        let contents: Vec<String> = h
            .gateway
            .history_at(1)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["one", "first", "two"]);
        assert_eq!(h.store.load(&id).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn system_prompt_is_sent_but_not_stored() {
        let h = harness(ScriptedGateway::answers(vec![answer("ok")]));
        let controller = h.controller.with_system_prompt("You are terse.");
        let id = SessionId::from("s");

        controller.run(&id, "hi").await.unwrap();

        let sent = h.gateway.history_at(0);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[0].content, "You are terse.");
        assert!(
            h.store
                .load(&id)
                .await
                .unwrap()
                .iter()
                .all(|m| m.role != Role::System)
        );
    }

    #[tokio::test]
    async fn events_follow_the_turn() {
        let h = harness(ScriptedGateway::answers(vec![
            tool_calls(vec![add("c1", 1.0, 2.0)]),
            answer("3"),
        ]));
        let mut rx = h.events.subscribe();

        h.controller.run(&SessionId::from("s"), "1+2").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match *event {
                TurnEvent::TurnStarted { .. } => "started",
                TurnEvent::ToolsRequested { .. } => "requested",
                TurnEvent::ToolExecuted { success, .. } => {
                    assert!(success);
                    "executed"
                }
                TurnEvent::TurnCompleted { rounds, .. } => {
                    assert_eq!(rounds, 1);
                    "completed"
                }
                TurnEvent::TurnFailed { .. } => "failed",
            });
        }
        assert_eq!(kinds, ["started", "requested", "executed", "completed"]);
    }

    #[tokio::test]
    async fn interrupted_round_is_closed_before_the_next_message() {
        let h = harness(ScriptedGateway::answers(vec![answer("Sorry, try again?")]));
        let id = SessionId::from("crashed");
        h.store.append(&id, &Message::user("2+3 and 4+5?")).await.unwrap();
        h.store
            .append(
                &id,
                &Message::assistant_with_calls("", vec![add("a", 2.0, 3.0), add("b", 4.0, 5.0)]),
            )
            .await
            .unwrap();
        h.store
            .append(&id, &Message::tool_result("a", r#"{"result":5.0}"#))
            .await
            .unwrap();

        h.controller.run(&id, "retry").await.unwrap();

        let sent = h.gateway.history_at(0);
        let roles: Vec<Role> = sent.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::User, Role::Assistant, Role::Tool, Role::Tool, Role::User]
        );
        assert_eq!(sent[3].tool_call_id.as_deref(), Some("b"));
        assert_eq!(sent[3].content, r#"{"error":"Tool call interrupted"}"#);

        let stored = h.store.load(&id).await.unwrap();
        assert_eq!(stored.len(), 6);
        assert_eq!(validate_pairing(&stored), Ok(()));
    }
}
