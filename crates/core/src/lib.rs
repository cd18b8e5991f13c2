//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley assistant.
//! This crate has **no transport or storage dependencies**; it defines the
//! domain model that the other crates implement against.
//!
//! ## Layout
//!
//! Every collaborator of the turn loop is a trait here:
//! - [`gateway::ModelGateway`] asks the language model what to do next
//! - [`tool::Tool`] is one callable action, collected in a [`tool::ToolRegistry`]
//! - [`session::SessionStore`] durably records each conversation
//!
//! Implementations live in their respective crates, so tests can swap in
//! scripted gateways and in-memory stores.

pub mod error;
pub mod event;
pub mod gateway;
pub mod locks;
pub mod message;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, GatewayError, StoreError, ToolError};
pub use event::{EventBus, TurnEvent};
pub use gateway::{ModelDecision, ModelGateway};
pub use locks::SessionLocks;
pub use message::{Message, Role, SessionId, ToolCall};
pub use session::SessionStore;
pub use tool::{ArgType, ArgumentSchema, Tool, ToolDefinition, ToolPayload, ToolRegistry, ToolResult};
