//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let the assistant act: search the web, do arithmetic,
//! fetch a stock quote or the weather. Each tool declares a flat argument
//! schema which is both sent to the model and checked before execution.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Primitive type expected for a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Number => "number",
            ArgType::Integer => "integer",
            ArgType::Boolean => "boolean",
            ArgType::Object => "object",
            ArgType::Array => "array",
        }
    }

    /// Whether a JSON value is acceptable for this type.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match self {
            ArgType::String => value.is_string(),
            ArgType::Number => value.is_number(),
            ArgType::Integer => value.is_i64() || value.is_u64(),
            ArgType::Boolean => value.is_boolean(),
            ArgType::Object => matches!(value, Value::Object(_)),
            ArgType::Array => value.is_array(),
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgType,
    pub description: String,
    pub required: bool,
}

/// Ordered field name → expected type mapping for a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSchema {
    fields: Vec<ArgSpec>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn required(mut self, name: &str, kind: ArgType, description: &str) -> Self {
        self.fields.push(ArgSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        });
        self
    }

    /// Add an optional field.
    pub fn optional(mut self, name: &str, kind: ArgType, description: &str) -> Self {
        self.fields.push(ArgSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: false,
        });
        self
    }

    pub fn fields(&self) -> &[ArgSpec] {
        &self.fields
    }

    /// Check that `arguments` is an object carrying every required field
    /// with the declared type. Unknown extra fields are tolerated.
    pub fn validate(&self, arguments: &serde_json::Value) -> Result<(), ToolError> {
        let Some(object) = arguments.as_object() else {
            return Err(ToolError::InvalidArguments(
                "arguments must be a JSON object".into(),
            ));
        };

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(serde_json::Value::Null) if field.required => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing required argument '{}'",
                        field.name
                    )));
                }
                None | Some(serde_json::Value::Null) => {}
                Some(value) if !field.kind.accepts(value) => {
                    return Err(ToolError::InvalidArguments(format!(
                        "argument '{}' must be of type {}",
                        field.name,
                        field.kind.as_str()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Render as a JSON Schema object for the model.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for field in &self.fields {
            properties.insert(
                field.name.clone(),
                serde_json::json!({
                    "type": field.kind.as_str(),
                    "description": field.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Outcome carried by a [`ToolResult`]: data or an error description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolPayload {
    Success(serde_json::Value),
    Error(String),
}

impl ToolPayload {
    /// Classify a value returned by a tool body.
    ///
    /// Tool bodies report expected failures as `{"error": "<text>"}`; such
    /// an object becomes [`ToolPayload::Error`].
    pub fn from_value(value: serde_json::Value) -> Self {
        if let Some(object) = value.as_object() {
            if object.len() == 1 {
                if let Some(serde_json::Value::String(message)) = object.get("error") {
                    return ToolPayload::Error(message.clone());
                }
            }
        }
        ToolPayload::Success(value)
    }

    /// The JSON document the model sees.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ToolPayload::Success(value) => value.clone(),
            ToolPayload::Error(message) => serde_json::json!({ "error": message }),
        }
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result answers
    pub call_id: String,

    pub payload: ToolPayload,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            call_id: call_id.into(),
            payload: ToolPayload::Success(value),
        }
    }

    pub fn error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            payload: ToolPayload::Error(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, ToolPayload::Error(_))
    }

    /// Serialized payload, as stored in the tool message.
    pub fn content(&self) -> String {
        self.payload.to_json().to_string()
    }
}

/// The core Tool trait.
///
/// Each built-in tool implements this trait. Tools are registered once in
/// the [`ToolRegistry`] at startup and never change afterwards.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Declared arguments.
    fn schema(&self) -> ArgumentSchema;

    /// Execute the tool with already-validated arguments.
    ///
    /// Expected failures should be returned as `Ok({"error": ...})`; an
    /// `Err` is still converted to an error payload by the executor.
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema().to_json_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Built mutably at startup, then shared read-only (typically behind an
/// `Arc`) by every turn.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&dyn Tool, ToolError> {
        self.tools
            .get(name)
            .map(|t| t.as_ref())
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Definitions of every tool, ordered by name.
    pub fn describe_all(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names, ordered.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
