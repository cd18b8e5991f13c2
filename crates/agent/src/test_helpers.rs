//! Shared test helpers: a scripted gateway and misbehaving tools.

use async_trait::async_trait;
use parley_core::error::{GatewayError, ToolError};
use parley_core::gateway::{ModelDecision, ModelGateway};
use parley_core::message::{Message, ToolCall};
use parley_core::tool::{ArgumentSchema, Tool, ToolDefinition};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A gateway that replays a queue of scripted decisions.
///
/// Records the history it was shown on every call. Once the script is
/// exhausted it keeps repeating `fallback`, if any, else reports
/// the model as unavailable.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<ModelDecision, GatewayError>>>,
    fallback: Option<ModelDecision>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Result<ModelDecision, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn answers(decisions: Vec<ModelDecision>) -> Self {
        Self::new(decisions.into_iter().map(Ok).collect())
    }

    /// Requests the same tool call forever.
    pub fn always(decision: ModelDecision) -> Self {
        let mut gateway = Self::new(Vec::new());
        gateway.fallback = Some(decision);
        gateway
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// The history passed to the n-th call.
    pub fn history_at(&self, call: usize) -> Vec<Message> {
        self.seen.lock().unwrap()[call].clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(
        &self,
        history: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ModelDecision, GatewayError> {
        self.seen.lock().unwrap().push(history.to_vec());
        match self.script.lock().unwrap().pop_front() {
            Some(next) => next,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| GatewayError::Unavailable("script exhausted".into())),
        }
    }
}

pub fn tool_calls(calls: Vec<ToolCall>) -> ModelDecision {
    ModelDecision::ToolCalls {
        content: String::new(),
        calls,
    }
}

pub fn answer(text: &str) -> ModelDecision {
    ModelDecision::FinalAnswer(text.into())
}

/// Always returns `Err`.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "always_fails"
    }
    fn description(&self) -> &str {
        "Fails every time"
    }
    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new()
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "always_fails".into(),
            reason: "upstream exploded".into(),
        })
    }
}

/// Panics every time.
pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "panics"
    }
    fn description(&self) -> &str {
        "Panics every time"
    }
    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new()
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        panic!("tool body blew up");
    }
}
