//! Tool executor — runs one tool call and never fails.
//!
//! Every problem (unknown tool, bad arguments, a tool error, even a panic
//! inside the tool body) becomes an error payload in the [`ToolResult`],
//! so the model sees the failure and can react to it.

use futures::FutureExt;
use parley_core::message::{Message, ToolCall};
use parley_core::tool::{ToolPayload, ToolRegistry, ToolResult};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one call.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();
        let result = self.run(call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result.payload {
            ToolPayload::Success(_) => {
                debug!(tool = %call.name, call_id = %call.id, duration_ms, "Tool succeeded");
            }
            ToolPayload::Error(message) => {
                warn!(tool = %call.name, call_id = %call.id, duration_ms, error = %message, "Tool returned an error");
            }
        }
        result
    }

    async fn run(&self, call: &ToolCall) -> ToolResult {
        let tool = match self.registry.lookup(&call.name) {
            Ok(tool) => tool,
            Err(e) => return ToolResult::error(&call.id, e.to_string()),
        };

        if let Err(e) = tool.schema().validate(&call.arguments) {
            return ToolResult::error(&call.id, e.to_string());
        }

        let outcome = AssertUnwindSafe(tool.execute(call.arguments.clone()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => ToolResult {
                call_id: call.id.clone(),
                payload: ToolPayload::from_value(value),
            },
            Ok(Err(e)) => ToolResult::error(&call.id, e.to_string()),
            Err(panic) => ToolResult::error(
                &call.id,
                format!("Tool '{}' panicked: {}", call.name, panic_message(&*panic)),
            ),
        }
    }

    /// The tool message answering `result`'s call.
    pub fn to_message(result: &ToolResult) -> Message {
        Message::tool_result(&result.call_id, result.content())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
