//! Model gateway — the abstraction over one language-model decision.
//!
//! Given the full history and the callable tools, the model either answers
//! in plain text or asks for one or more tool invocations. Never both.

use crate::error::GatewayError;
use crate::message::{Message, ToolCall};
use crate::tool::ToolDefinition;
use async_trait::async_trait;

/// What the model decided to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelDecision {
    /// Plain-text answer ending the turn.
    FinalAnswer(String),

    /// Tool invocations, executed in order. `content` is any text the model
    /// emitted alongside the calls (often empty).
    ToolCalls { content: String, calls: Vec<ToolCall> },
}

impl ModelDecision {
    /// Build a decision from an assistant reply: a non-empty call list
    /// means tools, anything else is the final answer.
    pub fn from_reply(content: String, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            ModelDecision::FinalAnswer(content)
        } else {
            ModelDecision::ToolCalls { content, calls }
        }
    }

    /// The assistant message to append to history for this decision.
    pub fn to_message(&self) -> Message {
        match self {
            ModelDecision::FinalAnswer(text) => Message::assistant(text.clone()),
            ModelDecision::ToolCalls { content, calls } => {
                Message::assistant_with_calls(content.clone(), calls.clone())
            }
        }
    }
}

/// The core gateway trait.
///
/// Implementations wrap a single call to a model that has been told which
/// tools exist. Transport failures surface as [`GatewayError::Unavailable`].
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "openai").
    fn name(&self) -> &str;

    /// Ask the model for its next step.
    async fn decide(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelDecision, GatewayError>;
}
