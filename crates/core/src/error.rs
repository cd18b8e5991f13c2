//! Error types for the Parley domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`AgentError`] is what a
//! turn surfaces to callers.

use thiserror::Error;

// --- Bounded context errors ---

/// Failures reaching the language model.
///
/// Every transport, status and decoding failure collapses into
/// [`GatewayError::Unavailable`]; the turn loop never retries it.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Model gateway not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt record in session {session}: {reason}")]
    Corrupt { session: String, reason: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unsupported operation '{0}'")]
    Unknown(String),

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

/// Errors surfaced to callers of a turn.
///
/// Tool failures never appear here; they are fed back to the model as data.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Turn exceeded the budget of {rounds} tool rounds")]
    TurnBudgetExceeded { rounds: u32 },
}
