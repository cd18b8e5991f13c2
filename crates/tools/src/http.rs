//! Shared HTTP plumbing for the networked tools.

use parley_core::error::ToolError;
use std::time::Duration;

pub(crate) fn client(tool_name: &str, timeout_secs: u64) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: format!("HTTP client: {e}"),
        })
}

/// GET `url` with `query` and decode the body as JSON.
///
/// Any failure comes back as a human-readable string, ready to be put in
/// an `{"error": ...}` payload.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<serde_json::Value, String> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("upstream returned status {}", status.as_u16()));
    }

    response
        .json()
        .await
        .map_err(|e| format!("invalid JSON response: {e}"))
}

pub(crate) fn error_payload(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "error": message.into() })
}
