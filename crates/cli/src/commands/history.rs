//! `parley history` — print one session's transcript.

use super::CliResult;
use parley_core::message::{Message, Role, SessionId};
use std::path::Path;

pub async fn run(config_path: Option<&Path>, session: String) -> CliResult {
    let config = super::load_config(config_path)?;
    let store = super::open_store(&config).await?;

    let messages = store.load(&SessionId::from(session.clone())).await;
    store.close().await?;
    let messages = messages?;

    if messages.is_empty() {
        eprintln!("  Session '{session}' has no messages.");
    }
    for message in &messages {
        println!("{}", render(message));
    }
    Ok(())
}

fn render(message: &Message) -> String {
    let time = message.timestamp.format("%Y-%m-%d %H:%M:%S");
    match message.role {
        Role::Assistant if message.requests_tools() => {
            let calls: Vec<String> = message
                .tool_calls
                .iter()
                .map(|c| format!("{}({})", c.name, c.arguments))
                .collect();
            format!("[{time}] assistant -> {}", calls.join(", "))
        }
        Role::Tool => format!(
            "[{time}] tool[{}]: {}",
            message.tool_call_id.as_deref().unwrap_or("?"),
            message.content
        ),
        role => format!("[{time}] {}: {}", role.as_str(), message.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::message::ToolCall;

    #[test]
    fn renders_each_role() {
        assert!(render(&Message::user("hi")).ends_with("user: hi"));

        let request = Message::assistant_with_calls(
            "",
            vec![ToolCall::new("c1", "get_weather", serde_json::json!({"city": "Rome"}))],
        );
        assert!(render(&request).ends_with(r#"assistant -> get_weather({"city":"Rome"})"#));

        let result = Message::tool_result("c1", r#"{"temperature_c":20.0}"#);
        assert!(render(&result).ends_with(r#"tool[c1]: {"temperature_c":20.0}"#));
    }
}
